use tgcdn_store::StoreError;
use tgcdn_upstream::UpstreamError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("local io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum GcError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("cache error: {0}")]
    Cache(#[from] tgcdn_core::kvcache::CacheError),
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}
