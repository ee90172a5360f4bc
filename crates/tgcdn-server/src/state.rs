use std::sync::Arc;

use tgcdn_core::kvcache::RedisCache;
use tgcdn_core::offload::OffloadHandle;
use tgcdn_core::config::Config;
use tgcdn_pipeline::Resolver;
use tgcdn_store::Store;
use tgcdn_upstream::MessagingClient;

/// Shared, `Arc`-held application state, constructed once in `main` and
/// passed by reference to every handler — never rediscovered from statics.
pub struct AppState {
    pub store: Store,
    pub resolver: Arc<Resolver<RedisCache>>,
    pub upstream: Arc<dyn MessagingClient>,
    pub offload: OffloadHandle,
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
}
