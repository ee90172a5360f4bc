use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

/// The L1 hot path: a TTL-bearing string -> string store. `url:<file_uuid>`
/// entries carry a 3600s TTL; `bot:<bot_id>` entries are written with
/// [`KvCache::set_forever`] since the credential mapping is immutable.
#[async_trait]
pub trait KvCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn set_forever(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn set_forever(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }
}

pub fn url_cache_key(file_uuid: &crate::FileUuid) -> String {
    format!("url:{file_uuid}")
}

pub fn bot_token_cache_key(bot_id: i16) -> String {
    format!("bot:{bot_id}")
}

pub const URL_CACHE_TTL: Duration = Duration::from_secs(3600);

/// An in-memory stand-in used by resolver/offload tests (in this crate and
/// downstream ones) so they don't need a live redis.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub struct FakeCache {
        pub entries: Mutex<HashMap<String, String>>,
    }

    impl Default for FakeCache {
        fn default() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
            }
        }
    }

    impl FakeCache {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl KvCache for FakeCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_ex(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn set_forever(&self, key: &str, value: &str) -> Result<(), CacheError> {
            self.set_ex(key, value, Duration::ZERO).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileUuid;

    #[test]
    fn key_formats_match_spec() {
        let uuid = FileUuid::new();
        assert_eq!(url_cache_key(&uuid), format!("url:{uuid}"));
        assert_eq!(bot_token_cache_key(7), "bot:7");
    }

    #[tokio::test]
    async fn fake_cache_round_trips() {
        let cache = testing::FakeCache::new();
        cache.set_ex("k", "v", Duration::from_secs(1)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }
}
