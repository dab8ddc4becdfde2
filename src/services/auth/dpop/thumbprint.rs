//! JWK thumbprint (RFC 7638) used as the `cnf.jkt` binding key.

use sha2::{Digest, Sha256};

use super::codec::base64url_encode;
use super::types::EcJwk;

/// base64url(SHA-256(canonical JWK)).
///
/// Canonical form for EC keys: members `crv, kty, x, y` in that order, no
/// whitespace.
pub fn jwk_thumbprint(jwk: &EcJwk) -> String {
    let canonical = format!(
        r#"{{"crv":"{}","kty":"{}","x":"{}","y":"{}"}}"#,
        jwk.crv, jwk.kty, jwk.x, jwk.y
    );

    base64url_encode(Sha256::digest(canonical.as_bytes()))
}
