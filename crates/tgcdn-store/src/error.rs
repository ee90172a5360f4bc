use tgcdn_core::file_uuid::InvalidFileUuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("failed to build connection pool: {0}")]
    PoolBuild(#[source] diesel_async::pooled_connection::PoolError),
    #[error("failed to check out a connection: {0}")]
    PoolRun(#[from] bb8::RunError<diesel_async::pooled_connection::PoolError>),
    #[error("invalid file_uuid")]
    InvalidUuid(#[from] InvalidFileUuid),
}
