//! Split a compact proof into its three segments and decode the JSON parts.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::codec::base64url_decode;
use super::types::{ProofClaims, ProofHeader, RawProofClaims};
use crate::services::auth::error::PopError;

/// A structurally valid, not yet trusted, proof.
#[derive(Debug, Clone)]
pub struct ParsedProof {
    pub header: ProofHeader,
    pub jwk: serde_json::Value,
    pub claims: ProofClaims,
    pub signature: Vec<u8>,
    signing_input: String,
}

impl ParsedProof {
    /// `base64url(header) "." base64url(payload)` exactly as received.
    pub fn signing_input(&self) -> &[u8] {
        self.signing_input.as_bytes()
    }
}

pub fn parse_proof(proof: &str) -> Result<ParsedProof, PopError> {
    let parts: Vec<&str> = proof.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = parts.as_slice() else {
        return Err(PopError::MalformedProof);
    };
    if header_b64.is_empty() || payload_b64.is_empty() || signature_b64.is_empty() {
        return Err(PopError::MalformedProof);
    }

    let header: ProofHeader = decode_json_segment(header_b64, "header")?;
    let jwk = match &header.jwk {
        Some(jwk) if !jwk.is_null() => jwk.clone(),
        _ => return Err(PopError::MissingKey),
    };

    let raw: RawProofClaims = decode_json_segment(payload_b64, "payload")?;
    let claims = ProofClaims::try_from(raw)?;

    let signature = base64url_decode(signature_b64)?;

    Ok(ParsedProof {
        header,
        jwk,
        claims,
        signature,
        signing_input: format!("{header_b64}.{payload_b64}"),
    })
}

fn decode_json_segment<T: DeserializeOwned>(
    segment: &str,
    name: &'static str,
) -> Result<T, PopError> {
    let bytes = base64url_decode(segment)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        debug!(segment = name, error = %e, "DPoP proof segment is not valid JSON");
        PopError::MalformedProof
    })
}
