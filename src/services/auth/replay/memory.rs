use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::services::auth::replay::store::{ReplayError, ReplayStore};

const SWEEP_INTERVAL: Duration = Duration::from_secs(30);
pub const MAX_ENTRIES: usize = 100_000;

/// In-process replay store for single-instance deployments.
///
/// Entries expire after their TTL; expired entries are swept at most every
/// 30 seconds while inserting. At `max_entries` live entries a sweep is
/// forced, and if the map is still full new proofs are refused.
#[derive(Debug)]
pub struct MemoryReplayStore {
    inner: Mutex<Entries>,
    max_entries: usize,
}

#[derive(Debug)]
struct Entries {
    seen: HashMap<String, Instant>,
    last_sweep: Instant,
}

impl Default for MemoryReplayStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReplayStore {
    pub fn new() -> Self {
        Self::with_max_entries(MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Entries {
                seen: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            max_entries,
        }
    }

    fn check_and_store_now(&self, key: &str, ttl_secs: u64) -> Result<bool, ReplayError> {
        let now = Instant::now();
        let mut entries = self.inner.lock().map_err(|_| ReplayError::Poisoned)?;

        if now.duration_since(entries.last_sweep) >= SWEEP_INTERVAL {
            entries.seen.retain(|_, expires_at| *expires_at > now);
            entries.last_sweep = now;
        }

        if entries
            .seen
            .get(key)
            .is_some_and(|expires_at| *expires_at > now)
        {
            return Ok(false);
        }

        if entries.seen.len() >= self.max_entries {
            let before = entries.seen.len();
            entries.seen.retain(|_, expires_at| *expires_at > now);
            entries.last_sweep = now;

            if entries.seen.len() >= self.max_entries {
                tracing::warn!(
                    size = entries.seen.len(),
                    before_sweep = before,
                    "replay seen-set at capacity, refusing new proof"
                );
                return Err(ReplayError::CapacityExceeded);
            }
        }

        entries
            .seen
            .insert(key.to_string(), now + Duration::from_secs(ttl_secs));
        Ok(true)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().map(|e| e.seen.len()).unwrap_or(0)
    }
}

impl ReplayStore for MemoryReplayStore {
    fn check_and_store<'a>(
        &'a self,
        key: &'a str,
        ttl_secs: u64,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ReplayError>> + Send + 'a>> {
        Box::pin(async move { self.check_and_store_now(key, ttl_secs) })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_use_is_stored_and_second_is_a_replay() {
        let store = MemoryReplayStore::new();

        assert!(store.check_and_store("jkt:jti-1", 60).await.unwrap());
        assert!(!store.check_and_store("jkt:jti-1", 60).await.unwrap());
        assert!(store.check_and_store("jkt:jti-2", 60).await.unwrap());
    }

    #[tokio::test]
    async fn expired_entry_is_admitted_again() {
        let store = MemoryReplayStore::new();

        assert!(store.check_and_store("jkt:jti", 0).await.unwrap());
        assert!(store.check_and_store("jkt:jti", 60).await.unwrap());
        assert!(!store.check_and_store("jkt:jti", 60).await.unwrap());
    }

    #[tokio::test]
    async fn full_store_refuses_new_keys_until_entries_expire() {
        let store = MemoryReplayStore::with_max_entries(2);
        assert!(store.check_and_store("a", 60).await.unwrap());
        assert!(store.check_and_store("b", 0).await.unwrap());

        // "b" has expired, so the forced sweep makes room
        assert!(store.check_and_store("c", 60).await.unwrap());

        assert!(matches!(
            store.check_and_store("d", 60).await,
            Err(ReplayError::CapacityExceeded)
        ));
        // known keys are still reported as replays
        assert!(!store.check_and_store("a", 60).await.unwrap());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn sweep_drops_expired_entries() {
        let store = MemoryReplayStore::new();
        store.check_and_store("a", 0).await.unwrap();
        store.check_and_store("b", 0).await.unwrap();
        assert_eq!(store.len(), 2);

        if let Ok(mut entries) = store.inner.lock() {
            entries.last_sweep = Instant::now() - SWEEP_INTERVAL;
        }
        store.check_and_store("c", 60).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
