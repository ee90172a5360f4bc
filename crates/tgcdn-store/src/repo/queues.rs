use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Binary, SmallInt, Timestamp};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncMysqlConnection, RunQueryDsl};

use tgcdn_core::{FileUuid, JobState};
use tgcdn_schema::models::{NewQueueRow, QueueRow};
use tgcdn_schema::schema::{files, queues};

use crate::error::StoreError;
use crate::pool::DbPool;

#[derive(QueryableByName)]
struct FileUuidRow {
    #[diesel(sql_type = Binary)]
    file_uuid: Vec<u8>,
}

/// The work queue. Every mutation here is CAS-guarded
/// (`WHERE state IN (...)`) — a rowcount of 0 means another actor (a
/// worker or the sweeper) already moved the row, and that is not an
/// error, just a lost race.
#[derive(Clone)]
pub struct QueuesRepository {
    pool: DbPool,
}

impl QueuesRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Ingest path: one new row in state READY, eligible for claim
    /// immediately.
    pub async fn insert_ready(&self, file_uuid: FileUuid, now: NaiveDateTime) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_into(queues::table)
            .values(NewQueueRow {
                file_uuid: file_uuid.to_vec(),
                state: JobState::Ready.as_i16(),
                available_at: now,
            })
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Lock up to `batch_size` eligible rows with `SKIP LOCKED` so
    /// concurrent workers never see the same candidate, then flip them to
    /// CLAIMED under this worker's `bot_id`. `SKIP LOCKED` has no Diesel
    /// query-builder equivalent, so the select half is raw SQL.
    pub async fn claim_batch(
        &self,
        bot_id: i16,
        batch_size: i64,
        now: NaiveDateTime,
    ) -> Result<Vec<FileUuid>, StoreError> {
        let mut conn = self.pool.get().await?;
        let claimed = conn
            .transaction(|conn| {
                async move {
                    let rows: Vec<FileUuidRow> = diesel::sql_query(
                        "SELECT file_uuid FROM queues \
                         WHERE state = ? AND available_at <= ? \
                         ORDER BY created_at ASC LIMIT ? \
                         FOR UPDATE SKIP LOCKED",
                    )
                    .bind::<SmallInt, _>(JobState::Ready.as_i16())
                    .bind::<Timestamp, _>(now)
                    .bind::<BigInt, _>(batch_size)
                    .load(conn)
                    .await?;

                    if rows.is_empty() {
                        return Ok::<_, diesel::result::Error>(Vec::new());
                    }

                    let uuids: Vec<Vec<u8>> = rows.into_iter().map(|r| r.file_uuid).collect();
                    diesel::update(queues::table.filter(queues::file_uuid.eq_any(uuids.clone())))
                        .set((
                            queues::state.eq(JobState::Claimed.as_i16()),
                            queues::bot_id.eq(Some(bot_id)),
                            queues::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .await?;

                    Ok(uuids)
                }
                .scope_boxed()
            })
            .await?;

        claimed
            .into_iter()
            .map(|bytes| FileUuid::from_bytes(&bytes).map_err(StoreError::from))
            .collect()
    }

    /// `UPDATE queues SET state=?, bot_id=?, updated_at=? WHERE file_uuid=? AND state IN (expected)`.
    /// Returns whether the row was actually transitioned.
    pub async fn cas_state(
        &self,
        file_uuid: FileUuid,
        new_state: JobState,
        bot_id: Option<i16>,
        expected: &[JobState],
        now: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let expected_codes: Vec<i16> = expected.iter().map(|s| s.as_i16()).collect();
        let rows = diesel::update(
            queues::table
                .filter(queues::file_uuid.eq(file_uuid.to_vec()))
                .filter(queues::state.eq_any(expected_codes)),
        )
        .set((
            queues::state.eq(new_state.as_i16()),
            queues::bot_id.eq(bot_id),
            queues::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .await?;
        Ok(rows > 0)
    }

    /// `{10,20,30} -> 100` on any processing exception.
    pub async fn mark_failed(&self, file_uuid: FileUuid, now: NaiveDateTime) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = diesel::update(
            queues::table
                .filter(queues::file_uuid.eq(file_uuid.to_vec()))
                .filter(queues::state.eq_any([
                    JobState::Claimed.as_i16(),
                    JobState::Uploading.as_i16(),
                    JobState::Uploaded.as_i16(),
                ])),
        )
        .set((queues::state.eq(JobState::Failed.as_i16()), queues::updated_at.eq(now)))
        .execute(&mut conn)
        .await?;
        Ok(rows > 0)
    }

    /// Insert into `files` and flip `queues.state` 30 -> 40, as one
    /// transaction. Tolerates the `files` row already existing (duplicate
    /// key => treat as success and still attempt the state transition),
    /// since both a worker and a recovering sweeper can race to commit the
    /// same upload.
    pub async fn commit(
        &self,
        file_uuid: FileUuid,
        file_id: &str,
        msg_id: i32,
        bot_id: i16,
        now: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let file_id = file_id.to_string();
        conn.transaction(|conn| async move { commit_conn(conn, file_uuid, &file_id, msg_id, bot_id, now).await }.scope_boxed())
            .await
            .map_err(StoreError::from)
    }

    /// Unstick rows stuck in `from_state` (CLAIMED or UPLOADING) that
    /// overran, with a per-row jitter on `available_at` to avoid a
    /// thundering herd. Called once per state so the audit log can record
    /// counts by prior state.
    pub async fn sweep_unstick(
        &self,
        from_state: JobState,
        stale_before: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(sweep_unstick_conn(&mut conn, from_state, stale_before, now).await?)
    }

    /// UPLOADED rows that have sat long enough that their owning worker
    /// probably died mid-commit.
    pub async fn uploaded_orphans(&self, stale_before: NaiveDateTime) -> Result<Vec<QueueRow>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(uploaded_orphans_conn(&mut conn, stale_before).await?)
    }

    /// FAILED rows awaiting backoff retry.
    pub async fn failed_rows(&self) -> Result<Vec<QueueRow>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(failed_rows_conn(&mut conn).await?)
    }

    /// Reset a FAILED row to READY with incremented `retry_count` and the
    /// computed backoff `available_at`.
    pub async fn retry_failed(
        &self,
        file_uuid: FileUuid,
        next_retry_count: i32,
        available_at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(retry_failed_conn(&mut conn, file_uuid, next_retry_count, available_at, now).await?)
    }

    /// The queue is a work list, not a history — delete every COMMITTED
    /// row.
    pub async fn delete_committed(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(delete_committed_conn(&mut conn).await?)
    }
}

// The functions below take an already-checked-out connection directly so
// the sweeper can run all of its phases inside one enclosing transaction
// instead of each phase taking its own connection from the pool. The
// `QueuesRepository` methods above are thin pool-acquiring wrappers
// around the same logic, for call sites that only need a single phase.

pub(crate) async fn sweep_unstick_conn(
    conn: &mut AsyncMysqlConnection,
    from_state: JobState,
    stale_before: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<u64, diesel::result::Error> {
    let affected = diesel::sql_query(
        "UPDATE queues SET state = 0, bot_id = NULL, \
         available_at = DATE_ADD(?, INTERVAL (1 + FLOOR(RAND() * 5)) SECOND), \
         updated_at = ? \
         WHERE state = ? AND updated_at < ?",
    )
    .bind::<Timestamp, _>(now)
    .bind::<Timestamp, _>(now)
    .bind::<SmallInt, _>(from_state.as_i16())
    .bind::<Timestamp, _>(stale_before)
    .execute(conn)
    .await?;
    Ok(affected as u64)
}

pub(crate) async fn uploaded_orphans_conn(
    conn: &mut AsyncMysqlConnection,
    stale_before: NaiveDateTime,
) -> Result<Vec<QueueRow>, diesel::result::Error> {
    queues::table
        .filter(queues::state.eq(JobState::Uploaded.as_i16()))
        .filter(queues::updated_at.lt(stale_before))
        .load::<QueueRow>(conn)
        .await
}

pub(crate) async fn failed_rows_conn(conn: &mut AsyncMysqlConnection) -> Result<Vec<QueueRow>, diesel::result::Error> {
    queues::table.filter(queues::state.eq(JobState::Failed.as_i16())).load::<QueueRow>(conn).await
}

pub(crate) async fn retry_failed_conn(
    conn: &mut AsyncMysqlConnection,
    file_uuid: FileUuid,
    next_retry_count: i32,
    available_at: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<bool, diesel::result::Error> {
    let rows = diesel::update(
        queues::table
            .filter(queues::file_uuid.eq(file_uuid.to_vec()))
            .filter(queues::state.eq(JobState::Failed.as_i16())),
    )
    .set((
        queues::state.eq(JobState::Ready.as_i16()),
        queues::retry_count.eq(next_retry_count),
        queues::available_at.eq(available_at),
        queues::bot_id.eq(Option::<i16>::None),
        queues::updated_at.eq(now),
    ))
    .execute(conn)
    .await?;
    Ok(rows > 0)
}

pub(crate) async fn delete_committed_conn(conn: &mut AsyncMysqlConnection) -> Result<u64, diesel::result::Error> {
    let affected = diesel::delete(queues::table.filter(queues::state.eq(JobState::Committed.as_i16())))
        .execute(conn)
        .await?;
    Ok(affected as u64)
}

/// Shared by the worker's own single-row commit (wrapped in its own
/// transaction by the caller) and the sweeper's re-commit phase (run
/// inside the sweeper's enclosing transaction) — the insert-then-update
/// pair itself never opens a transaction of its own, so it composes
/// either way.
pub(crate) async fn commit_conn(
    conn: &mut AsyncMysqlConnection,
    file_uuid: FileUuid,
    file_id: &str,
    msg_id: i32,
    bot_id: i16,
    now: NaiveDateTime,
) -> Result<bool, diesel::result::Error> {
    let insert = diesel::insert_into(files::table)
        .values((
            files::file_uuid.eq(file_uuid.to_vec()),
            files::file_id.eq(file_id.to_string()),
            files::msg_id.eq(msg_id),
            files::bot_id.eq(bot_id),
        ))
        .execute(conn)
        .await;

    match insert {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _)) => {
            // Already committed by a previous attempt (worker or sweeper);
            // fall through to the idempotent queue update.
        }
        Err(e) => return Err(e),
    }

    let rows = diesel::update(
        queues::table
            .filter(queues::file_uuid.eq(file_uuid.to_vec()))
            .filter(queues::state.eq(JobState::Uploaded.as_i16())),
    )
    .set((queues::state.eq(JobState::Committed.as_i16()), queues::updated_at.eq(now)))
    .execute(conn)
    .await?;

    Ok(rows > 0)
}
