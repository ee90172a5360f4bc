use diesel_async::{AsyncMysqlConnection, RunQueryDsl};

use tgcdn_schema::models::NewGcRunRow;
use tgcdn_schema::schema::gc_runs;

use crate::error::StoreError;
use crate::pool::DbPool;

/// Audit log for the sweeper: one row per tick that actually changed
/// something.
#[derive(Clone)]
pub struct GcRunsRepository {
    pool: DbPool,
}

/// Per-prior-state row counts for a single sweep tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepCounts {
    pub cnt_claimed: i32,
    pub cnt_uploading: i32,
    pub cnt_uploaded: i32,
    pub cnt_committed: i32,
    pub cnt_failed: i32,
}

impl SweepCounts {
    pub fn is_empty(&self) -> bool {
        self.cnt_claimed == 0
            && self.cnt_uploading == 0
            && self.cnt_uploaded == 0
            && self.cnt_committed == 0
            && self.cnt_failed == 0
    }
}

impl GcRunsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, counts: SweepCounts) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        record_conn(&mut conn, counts).await?;
        Ok(())
    }
}

pub(crate) async fn record_conn(conn: &mut AsyncMysqlConnection, counts: SweepCounts) -> Result<(), diesel::result::Error> {
    diesel::insert_into(gc_runs::table)
        .values(NewGcRunRow {
            cnt_10: counts.cnt_claimed,
            cnt_20: counts.cnt_uploading,
            cnt_30: counts.cnt_uploaded,
            cnt_40: counts.cnt_committed,
            cnt_100: counts.cnt_failed,
        })
        .execute(conn)
        .await?;
    Ok(())
}
