//! The bounded write-through offload channel.
//!
//! A single drainer task executes jobs in autocommit mode; producers never
//! block, and a full channel means the job is simply dropped — the queue is
//! a cache warm, not a journal. The concrete DB execution lives wherever the
//! pool is (`tgcdn-store`), so this module only owns the channel plumbing
//! and the job shape.

use tokio::sync::mpsc;

use crate::FileUuid;

/// The only job kind today: opportunistically warm the L2 `url_caches` row
/// after an L3 hit. A closed enum rather than a free-form `{query, params}`
/// payload, since Diesel's query builder is statically typed and each job
/// variant needs its own typed fields anyway.
#[derive(Debug, Clone)]
pub enum OffloadJob {
    WarmUrlCache {
        file_uuid: FileUuid,
        file_id: String,
        bot_token: String,
    },
}

#[derive(Clone)]
pub struct OffloadHandle {
    sender: mpsc::Sender<OffloadJob>,
}

impl OffloadHandle {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OffloadJob>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Never blocks. Drops the job and logs a warning if the channel is
    /// full or the drainer has shut down.
    pub fn try_enqueue(&self, job: OffloadJob) {
        if let Err(err) = self.sender.try_send(job) {
            tracing::warn!(?err, "offload channel full or closed, dropping cache warm");
        }
    }
}

/// Drains `rx`, handing each job to `execute` until the channel closes
/// (all senders dropped, e.g. at shutdown).
pub async fn run_drainer<F, Fut>(mut rx: mpsc::Receiver<OffloadJob>, mut execute: F)
where
    F: FnMut(OffloadJob) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    while let Some(job) = rx.recv().await {
        execute(job).await;
    }
    tracing::info!("offload drainer shutting down: channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn full_channel_drops_without_blocking() {
        let (handle, mut rx) = OffloadHandle::new(1);
        handle.try_enqueue(OffloadJob::WarmUrlCache {
            file_uuid: FileUuid::new(),
            file_id: "a".into(),
            bot_token: "t".into(),
        });
        // Second enqueue must not block even though nothing has drained yet.
        handle.try_enqueue(OffloadJob::WarmUrlCache {
            file_uuid: FileUuid::new(),
            file_id: "b".into(),
            bot_token: "t".into(),
        });
        drop(handle);
        let mut seen = 0;
        while rx.recv().await.is_some() {
            seen += 1;
        }
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn drainer_executes_every_job_until_closed() {
        let (handle, rx) = OffloadHandle::new(8);
        let count = Arc::new(AtomicUsize::new(0));
        for i in 0..5 {
            handle.try_enqueue(OffloadJob::WarmUrlCache {
                file_uuid: FileUuid::new(),
                file_id: i.to_string(),
                bot_token: "t".into(),
            });
        }
        drop(handle);
        let count_clone = count.clone();
        run_drainer(rx, |_job| {
            let count = count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }
}
