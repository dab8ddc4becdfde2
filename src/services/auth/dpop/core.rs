//! DPoP proof verification - core logic.
//!
//! No Axum and no replay store here. Middleware calls `verify_proof` with the
//! method and absolute URI it observed, then does replay bookkeeping.

use tracing::debug;

use super::parser::parse_proof;
use super::signature::verify_signature;
use super::types::{EcJwk, VerifiedProof};
use super::validator::validate_claims;
use crate::services::auth::error::PopError;

/// Verify a compact DPoP proof for the given request.
///
/// - `method`: HTTP method as received (compared case-sensitively with `htm`)
/// - `uri`: scheme + host + path of the request (compared exactly with `htu`)
///
/// Returns the proven key on success. Claims are checked before the signature.
pub fn verify_proof(proof: &str, method: &str, uri: &str) -> Result<VerifiedProof, PopError> {
    verify_proof_at(proof, method, uri, chrono::Utc::now().timestamp())
}

/// `verify_proof` with an explicit clock.
pub fn verify_proof_at(
    proof: &str,
    method: &str,
    uri: &str,
    now: i64,
) -> Result<VerifiedProof, PopError> {
    // 1) Structure: three segments, JSON header with jwk, all payload claims.
    let parsed = parse_proof(proof)?;

    // 2) htm / htu / iat / exp
    validate_claims(&parsed.claims, method, uri, now)?;

    // 3) Key shape, then ES256 over `header.payload`.
    let jwk = EcJwk::from_value(&parsed.jwk)?;
    verify_signature(&jwk, parsed.signing_input(), &parsed.signature)?;

    debug!(jti = %parsed.claims.jti, htm = %parsed.claims.htm, "DPoP proof verified");

    Ok(VerifiedProof::new(jwk, parsed.claims))
}
