//! base64url and the DER shapes expected by generic ECDSA primitives.
//!
//! Proofs carry raw `r‖s` signatures and bare JWK coordinates; verifiers want
//! an `ECDSA-Sig-Value` and a `SubjectPublicKeyInfo`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::services::auth::error::PopError;

pub const P256_COORDINATE_LEN: usize = 32;
pub const ES256_SIGNATURE_LEN: usize = 64;

// SEQUENCE { SEQUENCE { id-ecPublicKey, prime256v1 }, BIT STRING (0 unused bits) ...
const P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, // SubjectPublicKeyInfo
    0x30, 0x13, // AlgorithmIdentifier
    0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, // 1.2.840.10045.2.1
    0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, // 1.2.840.10045.3.1.7
    0x03, 0x42, 0x00, // BIT STRING
];

const SEC1_UNCOMPRESSED: u8 = 0x04;
const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url, tolerating trailing `=` padding.
pub fn base64url_decode(input: &str) -> Result<Vec<u8>, PopError> {
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|_| PopError::MalformedEncoding)
}

/// DER `SubjectPublicKeyInfo` for the P-256 point `(x, y)`.
pub fn ec_point_to_der(x: &[u8], y: &[u8]) -> Result<Vec<u8>, PopError> {
    if x.len() != P256_COORDINATE_LEN || y.len() != P256_COORDINATE_LEN {
        return Err(PopError::InvalidKeyFormat);
    }

    let mut der = Vec::with_capacity(P256_SPKI_PREFIX.len() + 1 + 2 * P256_COORDINATE_LEN);
    der.extend_from_slice(&P256_SPKI_PREFIX);
    der.push(SEC1_UNCOMPRESSED);
    der.extend_from_slice(x);
    der.extend_from_slice(y);
    Ok(der)
}

/// Convert a raw 64-byte `r‖s` signature into a DER `ECDSA-Sig-Value`.
pub fn raw_signature_to_der(raw: &[u8]) -> Result<Vec<u8>, PopError> {
    if raw.len() != ES256_SIGNATURE_LEN {
        return Err(PopError::InvalidSignatureLength);
    }

    let (r, s) = raw.split_at(P256_COORDINATE_LEN);
    let r = der_integer(r);
    let s = der_integer(s);

    // At most 2 * (2 + 33) bytes of content, so short-form lengths always fit.
    let mut der = Vec::with_capacity(2 + r.len() + s.len());
    der.push(DER_SEQUENCE);
    der.push((r.len() + s.len()) as u8);
    der.extend_from_slice(&r);
    der.extend_from_slice(&s);
    Ok(der)
}

// Minimal non-negative DER INTEGER for a big-endian unsigned value.
fn der_integer(bytes: &[u8]) -> Vec<u8> {
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    let value = &bytes[start..];
    let needs_pad = value.first().is_some_and(|b| b & 0x80 != 0);
    let len = value.len() + usize::from(needs_pad);

    let mut out = Vec::with_capacity(2 + len);
    out.push(DER_INTEGER);
    out.push(len as u8);
    if needs_pad {
        out.push(0x00);
    }
    out.extend_from_slice(value);
    out
}
