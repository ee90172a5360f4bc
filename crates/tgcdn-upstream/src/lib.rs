//! The upstream messaging platform client: `sendDocument` and `getFile`,
//! plus the error taxonomy that distinguishes a rate limit (retried in
//! place) from every other upstream failure (retried via the sweeper).

pub mod client;
pub mod error;

pub use client::{file_download_url, HttpMessagingClient, MessagingClient, SentDocument};
pub use error::UpstreamError;
