use diesel::prelude::*;
use diesel::sql_types::{Binary, Text};
use diesel_async::RunQueryDsl;

use tgcdn_core::FileUuid;
use tgcdn_schema::models::UrlCacheRow;
use tgcdn_schema::schema::url_caches::dsl as url_caches_dsl;

use crate::error::StoreError;
use crate::pool::DbPool;

/// L2 of the resolver's three-tier lookup. Unlike L1 it is not
/// TTL-bounded: the `(file_id, bot_token)` pair it holds is durable, only
/// the upstream path materialized from it expires.
#[derive(Clone)]
pub struct UrlCacheRepository {
    pool: DbPool,
}

impl UrlCacheRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_uuid(&self, file_uuid: FileUuid) -> Result<Option<UrlCacheRow>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = url_caches_dsl::url_caches
            .filter(url_caches_dsl::file_uuid.eq(file_uuid.to_vec()))
            .first::<UrlCacheRow>(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    /// `INSERT IGNORE` — MySQL has no query-builder-level upsert DSL in
    /// Diesel, so this is hand-written SQL. A losing racer here just means
    /// another reader already warmed the same row.
    pub async fn insert_ignore(
        &self,
        file_uuid: FileUuid,
        file_id: &str,
        bot_token: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        diesel::sql_query(
            "INSERT IGNORE INTO url_caches (file_uuid, file_id, bot_token) VALUES (?, ?, ?)",
        )
        .bind::<Binary, _>(file_uuid.to_vec())
        .bind::<Text, _>(file_id)
        .bind::<Text, _>(bot_token)
        .execute(&mut conn)
        .await?;
        Ok(())
    }
}
