use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tgcdn_core::{FileUuid, JobState};
use tgcdn_store::Store;
use tgcdn_upstream::{MessagingClient, UpstreamError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::WorkerError;

const MAX_RATE_LIMIT_RETRIES: u32 = 5;

/// One credential, one worker: drains the queue with its own `bot_id`/
/// token and never talks to another worker.
pub struct Worker {
    bot_id: i16,
    bot_token: String,
    chat_id: i64,
    temp_dir: PathBuf,
    batch_size: i64,
    poll_interval: Duration,
    store: Store,
    upstream: Arc<dyn MessagingClient>,
}

/// A `oneshot` tells the loop to stop at its next suspension point, and
/// `stop()` waits for the task to actually exit.
pub struct WorkerHandle {
    task: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

impl WorkerHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
        }
    }
}

impl Worker {
    pub fn new(
        bot_id: i16,
        bot_token: String,
        chat_id: i64,
        temp_dir: PathBuf,
        batch_size: i64,
        poll_interval: Duration,
        store: Store,
        upstream: Arc<dyn MessagingClient>,
    ) -> Self {
        Self {
            bot_id,
            bot_token,
            chat_id,
            temp_dir,
            batch_size,
            poll_interval,
            store,
            upstream,
        }
    }

    pub fn spawn(self) -> WorkerHandle {
        let (tx_shutdown, rx_shutdown) = oneshot::channel();
        let task = tokio::spawn(self.run(rx_shutdown));
        WorkerHandle {
            task,
            shutdown: tx_shutdown,
        }
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        info!(bot_id = self.bot_id, "worker started");
        loop {
            let claimed = match self.store.queues.claim_batch(self.bot_id, self.batch_size, Utc::now().naive_utc()).await {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(bot_id = self.bot_id, error = %e, "claim batch failed");
                    Vec::new()
                }
            };

            if claimed.is_empty() {
                debug!(bot_id = self.bot_id, "no eligible jobs, sleeping");
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
                continue;
            }

            for file_uuid in claimed {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!(bot_id = self.bot_id, "worker stopping mid-batch");
                        return;
                    }
                    result = self.process(file_uuid) => {
                        if let Err(e) = result {
                            warn!(bot_id = self.bot_id, %file_uuid, error = %e, "job failed");
                        }
                    }
                }
            }
        }
        info!(bot_id = self.bot_id, "worker stopped");
    }

    async fn process(&self, file_uuid: FileUuid) -> Result<(), WorkerError> {
        let now = Utc::now().naive_utc();

        if !self
            .store
            .queues
            .cas_state(file_uuid, JobState::Uploading, Some(self.bot_id), &[JobState::Claimed], now)
            .await?
        {
            // Lost the race (sweeper already reclaimed it); nothing to do.
            return Ok(());
        }

        let staged_path = self.temp_dir.join(file_uuid.to_string());
        let caption = file_uuid.to_string();

        let sent = match self.upload_with_retry(&staged_path, &caption).await {
            Ok(sent) => sent,
            Err(e) => {
                self.fail(file_uuid).await;
                return Err(e);
            }
        };

        if !self
            .store
            .queues
            .cas_state(file_uuid, JobState::Uploaded, Some(self.bot_id), &[JobState::Uploading], Utc::now().naive_utc())
            .await?
        {
            return Ok(());
        }

        let committed = self
            .store
            .queues
            .commit(file_uuid, &sent.file_id, sent.message_id, self.bot_id, Utc::now().naive_utc())
            .await?;

        if committed {
            info!(bot_id = self.bot_id, %file_uuid, "committed");
            if let Err(e) = tokio::fs::remove_file(&staged_path).await {
                warn!(bot_id = self.bot_id, %file_uuid, error = %e, "failed to delete staged file");
            }
        }

        Ok(())
    }

    async fn upload_with_retry(
        &self,
        staged_path: &std::path::Path,
        caption: &str,
    ) -> Result<tgcdn_upstream::SentDocument, WorkerError> {
        let mut attempt = 0;
        loop {
            match self
                .upstream
                .send_document(&self.bot_token, self.chat_id, staged_path, caption)
                .await
            {
                Ok(sent) => return Ok(sent),
                Err(UpstreamError::RateLimited { retry_after }) if attempt + 1 < MAX_RATE_LIMIT_RETRIES => {
                    attempt += 1;
                    warn!(
                        bot_id = self.bot_id,
                        attempt,
                        retry_after_secs = retry_after.as_secs(),
                        "rate limited, retrying in place"
                    );
                    tokio::time::sleep(retry_after).await;
                }
                Err(e) => return Err(WorkerError::Upstream(e)),
            }
        }
    }

    async fn fail(&self, file_uuid: FileUuid) {
        let now = Utc::now().naive_utc();
        if let Err(e) = self.store.queues.mark_failed(file_uuid, now).await {
            error!(bot_id = self.bot_id, %file_uuid, error = %e, "failed to mark job as failed");
        }
    }
}
