use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use tgcdn_core::FileUuid;
use tgcdn_schema::models::FileRow;
use tgcdn_schema::schema::files::dsl as files_dsl;

use crate::error::StoreError;
use crate::pool::DbPool;

/// Write-once: a row exists for `file_uuid` iff the upload reached
/// terminal success, and it is never mutated afterwards.
#[derive(Clone)]
pub struct FilesRepository {
    pool: DbPool,
}

impl FilesRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_uuid(&self, file_uuid: FileUuid) -> Result<Option<FileRow>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = files_dsl::files
            .filter(files_dsl::file_uuid.eq(file_uuid.to_vec()))
            .first::<FileRow>(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }
}
