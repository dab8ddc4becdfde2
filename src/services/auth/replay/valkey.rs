use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use crate::services::{
    auth::replay::store::{ReplayError, ReplayStore},
    cache::{CacheClient, ValkeyClient},
};

/// Valkey-backed replay store (Redis protocol), shared across instances.
///
/// Fail-closed policy is implemented by returning `Err` on any backend error;
/// callers should treat that as authentication failure.
#[derive(Clone)]
pub struct ValkeyReplayStore<C: CacheClient> {
    cache: Arc<C>,
    // Key prefix to avoid collisions across environments
    prefix: String,
}

impl ValkeyReplayStore<ValkeyClient> {
    pub async fn connect(redis_url: &str) -> Result<Self, ReplayError> {
        let client = ValkeyClient::new(redis_url).await?;
        Ok(Self::new_with_cache(Arc::new(client), "dpop:replay"))
    }
}

impl<C: CacheClient> ValkeyReplayStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, raw: &str) -> String {
        format!("{}:{}", self.prefix, raw)
    }
}

impl<C: CacheClient> ReplayStore for ValkeyReplayStore<C> {
    fn check_and_store<'a>(
        &'a self,
        key: &'a str,
        ttl_secs: u64,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ReplayError>> + Send + 'a>> {
        Box::pin(async move {
            let full_key = self.key(key);

            // SET <key> "1" NX EX <ttl>
            let res = self
                .cache
                .set_if_absent_with_ttl(&full_key, "1", Duration::from_secs(ttl_secs))
                .await?;

            Ok(res)
        })
    }

    fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::client::{CacheError, CacheResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // Records SET NX calls instead of talking to a server.
    #[derive(Clone, Default)]
    struct FakeCache {
        keys: Arc<Mutex<HashMap<String, Duration>>>,
        fail: bool,
    }

    #[async_trait]
    impl CacheClient for FakeCache {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn set_if_absent_with_ttl(
            &self,
            key: &str,
            _value: &str,
            ttl: Duration,
        ) -> CacheResult<bool> {
            if self.fail {
                return Err(CacheError::BackendConnection("down".into()));
            }
            let mut keys = self.keys.lock().unwrap();
            if keys.contains_key(key) {
                return Ok(false);
            }
            keys.insert(key.to_string(), ttl);
            Ok(true)
        }
    }

    #[tokio::test]
    async fn prefixes_keys_and_passes_ttl() {
        let cache = Arc::new(FakeCache::default());
        let store = ValkeyReplayStore::new_with_cache(cache.clone(), "dpop:replay");

        assert!(store.check_and_store("jkt:jti", 42).await.unwrap());
        assert!(!store.check_and_store("jkt:jti", 42).await.unwrap());

        let keys = cache.keys.lock().unwrap();
        assert_eq!(keys.get("dpop:replay:jkt:jti"), Some(&Duration::from_secs(42)));
        assert_eq!(store.backend_name(), "fake");
    }

    #[tokio::test]
    async fn backend_failure_is_an_error() {
        let cache = Arc::new(FakeCache {
            fail: true,
            ..FakeCache::default()
        });
        let store = ValkeyReplayStore::new_with_cache(cache, "p");

        assert!(matches!(
            store.check_and_store("k", 1).await,
            Err(ReplayError::Cache(CacheError::BackendConnection(_)))
        ));
    }
}
