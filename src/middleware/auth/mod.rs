//! DPoP admission for the two request paths.
//!
//! - `proof`: login-bind routes (proof only, no access token yet)
//! - `access`: protected routes (access token + proof)
//! - `request_uri`: `htu` reconstruction shared by both
pub mod access;
pub mod proof;
pub mod request_uri;

use axum::http::HeaderMap;
use tracing::warn;

use crate::services::auth::PopError;
use crate::services::auth::dpop::VerifiedProof;
use crate::services::auth::replay::{replay_key, replay_ttl_seconds};
use crate::state::AppState;

pub const DPOP_HEADER: &str = "dpop";

/// The single `DPoP` header value, if any. More than one header is malformed.
pub(crate) fn dpop_header(headers: &HeaderMap) -> Result<Option<&str>, PopError> {
    let mut values = headers.get_all(DPOP_HEADER).iter();
    let Some(first) = values.next() else {
        return Ok(None);
    };
    if values.next().is_some() {
        return Err(PopError::MalformedProof);
    }
    first
        .to_str()
        .map(|v| Some(v.trim()))
        .map_err(|_| PopError::MalformedEncoding)
}

/// Record the proof's `jti`; a second use inside its freshness window fails.
pub(crate) async fn check_replay(state: &AppState, proof: &VerifiedProof) -> Result<(), PopError> {
    let Some(store) = state.replay.as_ref() else {
        return Ok(());
    };

    let key = replay_key(proof);
    let ttl = replay_ttl_seconds(proof, chrono::Utc::now().timestamp());

    match store.check_and_store(&key, ttl).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!(jti = %proof.jti(), "DPoP proof replayed");
            Err(PopError::ProofReplayed)
        }
        Err(e) => {
            warn!(backend = store.backend_name(), error = %e, "replay store unavailable");
            Err(PopError::ReplayBackend)
        }
    }
}
