use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("upstream http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream api error: status={status}, body={body}")]
    Api { status: u16, body: String },
}
