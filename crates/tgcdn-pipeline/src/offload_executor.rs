use tgcdn_core::offload::OffloadJob;
use tgcdn_store::Store;
use tracing::warn;

/// Executes one offload job against the store. Called from the drainer
/// loop in `tgcdn_core::offload::run_drainer`; errors are logged and
/// discarded since a cache warm is best-effort — the next reader just
/// falls back to a lower cache tier.
pub async fn execute(store: &Store, job: OffloadJob) {
    match job {
        OffloadJob::WarmUrlCache {
            file_uuid,
            file_id,
            bot_token,
        } => {
            if let Err(e) = store.url_cache.insert_ignore(file_uuid, &file_id, &bot_token).await {
                warn!(%file_uuid, error = %e, "offload cache warm failed");
            }
        }
    }
}
