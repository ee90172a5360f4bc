use std::time::Duration;

use chrono::Utc;
use tgcdn_store::Store;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::error::GcError;

/// The reconciliation sweeper: one long-running task that runs a single
/// transactional reconciliation pass every tick, catching jobs a crashed
/// or killed worker left stranded mid-flight.
pub struct Sweeper {
    store: Store,
    interval: Duration,
    stale_after: Duration,
}

pub struct SweeperHandle {
    task: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

impl SweeperHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
        }
    }
}

impl Sweeper {
    pub fn new(store: Store, interval: Duration, stale_after: Duration) -> Self {
        Self {
            store,
            interval,
            stale_after,
        }
    }

    pub fn spawn(self) -> SweeperHandle {
        let (tx_shutdown, rx_shutdown) = oneshot::channel();
        let task = tokio::spawn(self.run(rx_shutdown));
        SweeperHandle {
            task,
            shutdown: tx_shutdown,
        }
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("sweeper started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        error!(error = %e, "sweep tick failed");
                    }
                }
            }
        }
        info!("sweeper stopped");
    }

    async fn sweep(&self) -> Result<(), GcError> {
        let now = Utc::now().naive_utc();
        let stale_before = now - chrono::Duration::from_std(self.stale_after).unwrap();

        let counts = self.store.run_gc_sweep(stale_before, now).await?;

        if !counts.is_empty() {
            info!(
                cnt_claimed = counts.cnt_claimed,
                cnt_uploading = counts.cnt_uploading,
                cnt_uploaded = counts.cnt_uploaded,
                cnt_committed = counts.cnt_committed,
                cnt_failed = counts.cnt_failed,
                "sweep made progress"
            );
        }

        Ok(())
    }
}
