//! Claim checks for a parsed proof: htm, htu, iat window, exp.

use tracing::debug;

use super::types::ProofClaims;
use crate::services::auth::error::PopError;

/// Allowed distance between `iat` and server time, in either direction.
pub const PROOF_IAT_WINDOW_SECONDS: u64 = 60;

/// Run every claim check and report the first failure in this order:
/// method, URI, iat window, expiry.
///
/// `uri` must be the absolute request URI as the server sees it
/// (scheme + host + path, no query).
pub fn validate_claims(
    claims: &ProofClaims,
    method: &str,
    uri: &str,
    now: i64,
) -> Result<(), PopError> {
    let failures: Vec<PopError> = [
        (claims.htm != method).then_some(PopError::MethodMismatch),
        (claims.htu != uri).then_some(PopError::UriMismatch),
        (now.abs_diff(claims.iat) > PROOF_IAT_WINDOW_SECONDS).then_some(PopError::StaleProof),
        (now > claims.exp).then_some(PopError::ProofExpired),
    ]
    .into_iter()
    .flatten()
    .collect();

    for failure in &failures {
        debug!(
            error = %failure,
            jti = %claims.jti,
            htm = %claims.htm,
            htu = %claims.htu,
            iat = claims.iat,
            exp = claims.exp,
            now,
            "DPoP claim check failed"
        );
    }

    match failures.first() {
        Some(first) => Err(*first),
        None => Ok(()),
    }
}
