pub mod config;
pub mod file_uuid;
pub mod job_state;
pub mod kvcache;
pub mod offload;
pub mod retry;

pub use file_uuid::FileUuid;
pub use job_state::JobState;
