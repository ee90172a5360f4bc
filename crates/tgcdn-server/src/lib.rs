//! Axum HTTP ingest/content endpoints, MIME sniffing, and the shared
//! application state they run against.

pub mod error;
pub mod handlers;
pub mod mime;
pub mod router;
pub mod state;

pub use router::build as build_router;
pub use state::AppState;
