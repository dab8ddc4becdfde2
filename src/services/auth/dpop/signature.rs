//! ES256 signature verification against the JWK embedded in the proof.

use p256::ecdsa::{Signature, VerifyingKey, signature::Verifier};
use p256::pkcs8::DecodePublicKey;
use tracing::debug;

use super::codec::{base64url_decode, ec_point_to_der, raw_signature_to_der};
use super::types::EcJwk;
use crate::services::auth::error::PopError;

/// Rebuild the P-256 public key from the JWK coordinates.
pub fn verifying_key(jwk: &EcJwk) -> Result<VerifyingKey, PopError> {
    let x = base64url_decode(&jwk.x).map_err(|_| PopError::InvalidKeyFormat)?;
    let y = base64url_decode(&jwk.y).map_err(|_| PopError::InvalidKeyFormat)?;
    let der = ec_point_to_der(&x, &y)?;

    // Correct length but not a point on the curve.
    VerifyingKey::from_public_key_der(&der).map_err(|_| {
        debug!("DPoP jwk is not a valid P-256 point");
        PopError::SignatureInvalid
    })
}

/// Verify a raw `r‖s` signature over `signing_input`.
///
/// Malformed inputs keep their own error kinds; anything the primitive
/// rejects is reported as `SignatureInvalid` and nothing more.
pub fn verify_signature(
    jwk: &EcJwk,
    signing_input: &[u8],
    raw_signature: &[u8],
) -> Result<(), PopError> {
    let key = verifying_key(jwk)?;
    let der = raw_signature_to_der(raw_signature)?;

    let signature = Signature::from_der(&der).map_err(|_| PopError::SignatureInvalid)?;
    key.verify(signing_input, &signature)
        .map_err(|_| PopError::SignatureInvalid)
}
