//! `jti` seen-set for DPoP proofs.
//!
//! Verification itself stays pure; the HTTP pipeline records each admitted
//! proof here and rejects a second use while the proof could still pass the
//! freshness checks.
pub mod memory;
pub mod store;
pub mod valkey;

pub use memory::MemoryReplayStore;
pub use store::{ReplayError, ReplayStore};
pub use valkey::ValkeyReplayStore;

use crate::services::auth::dpop::VerifiedProof;
use crate::services::auth::dpop::validator::PROOF_IAT_WINDOW_SECONDS;

/// Replay key: one namespace per client key so `jti` collisions between
/// clients do not reject each other.
pub fn replay_key(proof: &VerifiedProof) -> String {
    format!("{}:{}", proof.thumbprint(), proof.jti())
}

/// Seconds until the proof can no longer be admitted: the earlier of `exp`
/// and the end of the `iat` window, never less than one second.
pub fn replay_ttl_seconds(proof: &VerifiedProof, now: i64) -> u64 {
    let iat_deadline = proof.iat().saturating_add(PROOF_IAT_WINDOW_SECONDS as i64);
    let deadline = proof.exp().min(iat_deadline);
    let remaining = deadline.saturating_sub(now);
    u64::try_from(remaining).unwrap_or(0).max(1)
}
