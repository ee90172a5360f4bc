//! The relational store: a Diesel-async connection pool plus one
//! repository per table, each exposing the CAS-style methods the worker
//! and sweeper drive the job state machine with.

use chrono::NaiveDateTime;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::AsyncConnection;
use rand::Rng;
use tgcdn_core::{retry, FileUuid, JobState};

pub mod error;
pub mod pool;
pub mod repo;

pub use error::StoreError;
pub use pool::{build_pool, DbPool};
pub use repo::{BotsRepository, FilesRepository, GcRunsRepository, QueuesRepository, SweepCounts, UrlCacheRepository};

use repo::gc_runs::record_conn;
use repo::queues::{commit_conn, delete_committed_conn, failed_rows_conn, retry_failed_conn, sweep_unstick_conn, uploaded_orphans_conn};

/// The full set of repositories, constructed once from a shared pool and
/// cloned cheaply (each repository only holds a `Pool` handle, which is an
/// `Arc` internally) into the pipeline and server layers.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
    pub bots: BotsRepository,
    pub files: FilesRepository,
    pub queues: QueuesRepository,
    pub url_cache: UrlCacheRepository,
    pub gc_runs: GcRunsRepository,
}

impl Store {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool: pool.clone(),
            bots: BotsRepository::new(pool.clone()),
            files: FilesRepository::new(pool.clone()),
            queues: QueuesRepository::new(pool.clone()),
            url_cache: UrlCacheRepository::new(pool.clone()),
            gc_runs: GcRunsRepository::new(pool),
        }
    }

    /// Runs the sweeper's unstick / re-commit / retry / delete / audit
    /// phases as one transaction on a single connection, rather than each
    /// phase checking out its own connection from the pool. Reuses the
    /// same connection-taking helpers the single-row repository methods
    /// wrap individually.
    pub async fn run_gc_sweep(&self, stale_before: NaiveDateTime, now: NaiveDateTime) -> Result<SweepCounts, StoreError> {
        let mut conn = self.pool.get().await?;
        conn.transaction(|conn| {
            async move {
                let cnt_claimed = sweep_unstick_conn(conn, JobState::Claimed, stale_before, now).await? as i32;
                let cnt_uploading = sweep_unstick_conn(conn, JobState::Uploading, stale_before, now).await? as i32;

                let mut cnt_uploaded = 0i32;
                for row in uploaded_orphans_conn(conn, stale_before).await? {
                    let file_uuid = FileUuid::from_bytes(&row.file_uuid)?;
                    let (Some(file_id), Some(msg_id), Some(bot_id)) = (row.file_id, row.msg_id, row.bot_id) else {
                        continue;
                    };
                    if commit_conn(conn, file_uuid, &file_id, msg_id, bot_id, now).await? {
                        cnt_uploaded += 1;
                    }
                }

                let mut cnt_failed = 0i32;
                let mut rng = rand::thread_rng();
                for row in failed_rows_conn(conn).await? {
                    let file_uuid = FileUuid::from_bytes(&row.file_uuid)?;
                    let delay = retry::backoff_delay(row.retry_count as u32, &mut rng);
                    let next_retry_count = row.retry_count + 1;
                    let available_at = now + chrono::Duration::from_std(delay).unwrap();
                    if retry_failed_conn(conn, file_uuid, next_retry_count, available_at, now).await? {
                        cnt_failed += 1;
                    }
                }

                let cnt_committed = delete_committed_conn(conn).await? as i32;

                let counts = SweepCounts {
                    cnt_claimed,
                    cnt_uploading,
                    cnt_uploaded,
                    cnt_committed,
                    cnt_failed,
                };

                if !counts.is_empty() {
                    record_conn(conn, counts).await?;
                }

                Ok(counts)
            }
            .scope_boxed()
        })
        .await
    }
}
