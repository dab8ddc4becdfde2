use std::{future::Future, pin::Pin};

use crate::services::cache::CacheError;

/// Seen-set of DPoP proofs, keyed by `<jkt>:<jti>`.
///
/// `check_and_store` answers:
/// - `Ok(true)`: first use, now recorded until `ttl_secs` elapse
/// - `Ok(false)`: the proof was already used
/// - `Err(_)`: backend failure; the request is rejected
pub trait ReplayStore: Send + Sync {
    fn check_and_store<'a>(
        &'a self,
        key: &'a str,
        ttl_secs: u64,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ReplayError>> + Send + 'a>>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("replay store lock poisoned")]
    Poisoned,

    #[error("replay store is full")]
    CapacityExceeded,
}
