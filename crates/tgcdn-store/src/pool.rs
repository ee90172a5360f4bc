use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncMysqlConnection;

use crate::error::StoreError;

pub type DbPool = Pool<AsyncMysqlConnection>;

/// Builds the connection pool, sized at a max of 20 connections; bb8 has
/// no separate min-size knob, so only max_size is set.
pub async fn build_pool(database_url: &str) -> Result<DbPool, StoreError> {
    let manager = AsyncDieselConnectionManager::<AsyncMysqlConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(20)
        .build(manager)
        .await
        .map_err(StoreError::PoolBuild)?;
    Ok(pool)
}
