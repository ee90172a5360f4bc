//! The worker pool (§4.2), reconciliation sweeper (§4.3), and resolver
//! (§4.4). These three share the store and upstream client tightly enough
//! that splitting them into separate crates would only add re-export
//! ceremony.

pub mod error;
pub mod gc;
pub mod offload_executor;
pub mod resolver;
pub mod worker;

pub use error::{GcError, ResolverError, WorkerError};
pub use gc::{Sweeper, SweeperHandle};
pub use resolver::{ResolvedUrl, Resolver};
pub use worker::{Worker, WorkerHandle};
