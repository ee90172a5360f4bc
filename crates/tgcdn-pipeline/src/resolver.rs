use std::sync::Arc;

use tgcdn_core::kvcache::{bot_token_cache_key, url_cache_key, KvCache, URL_CACHE_TTL};
use tgcdn_core::offload::{OffloadHandle, OffloadJob};
use tgcdn_core::FileUuid;
use tgcdn_store::Store;
use tgcdn_upstream::{file_download_url, MessagingClient};
use tracing::debug;

use crate::error::ResolverError;

#[derive(Debug, Clone)]
pub struct ResolvedUrl {
    pub url: String,
}

/// Three-tier URL lookup: L1 KV cache, L2 `url_caches`, L3 `files`. Held
/// behind an `Arc` in the server's shared state, not reached through
/// statics.
pub struct Resolver<C: KvCache> {
    store: Store,
    cache: Arc<C>,
    upstream: Arc<dyn MessagingClient>,
    offload: OffloadHandle,
}

impl<C: KvCache> Resolver<C> {
    pub fn new(store: Store, cache: Arc<C>, upstream: Arc<dyn MessagingClient>, offload: OffloadHandle) -> Self {
        Self {
            store,
            cache,
            upstream,
            offload,
        }
    }

    pub async fn resolve(&self, file_uuid: FileUuid) -> Result<Option<ResolvedUrl>, ResolverError> {
        let l1_key = url_cache_key(&file_uuid);
        if let Some(url) = self.cache.get(&l1_key).await? {
            debug!(%file_uuid, "resolver L1 hit");
            return Ok(Some(ResolvedUrl { url }));
        }

        if let Some(row) = self.store.url_cache.get_by_uuid(file_uuid).await? {
            if let (Some(file_id), Some(bot_token)) = (row.file_id, row.bot_token) {
                debug!(%file_uuid, "resolver L2 hit");
                let url = self.materialize(&bot_token, &file_id).await?;
                self.cache.set_ex(&l1_key, &url, URL_CACHE_TTL).await?;
                return Ok(Some(ResolvedUrl { url }));
            }
        }

        if let Some(file_row) = self.store.files.get_by_uuid(file_uuid).await? {
            debug!(%file_uuid, "resolver L3 hit");
            let bot_token = self.credential(file_row.bot_id).await?;
            let Some(bot_token) = bot_token else {
                return Ok(None);
            };
            let url = self.materialize(&bot_token, &file_row.file_id).await?;
            self.cache.set_ex(&l1_key, &url, URL_CACHE_TTL).await?;

            self.offload.try_enqueue(OffloadJob::WarmUrlCache {
                file_uuid,
                file_id: file_row.file_id,
                bot_token,
            });

            return Ok(Some(ResolvedUrl { url }));
        }

        Ok(None)
    }

    async fn credential(&self, bot_id: i16) -> Result<Option<String>, ResolverError> {
        let key = bot_token_cache_key(bot_id);
        if let Some(token) = self.cache.get(&key).await? {
            return Ok(Some(token));
        }

        let token = self.store.bots.get_token(bot_id).await?;
        if let Some(token) = &token {
            self.cache.set_forever(&key, token).await?;
        }
        Ok(token)
    }

    async fn materialize(&self, bot_token: &str, file_id: &str) -> Result<String, ResolverError> {
        let file_path = self.upstream.get_file_path(bot_token, file_id).await?;
        Ok(file_download_url(bot_token, &file_path))
    }
}
