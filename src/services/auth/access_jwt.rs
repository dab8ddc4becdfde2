use std::sync::Arc;

use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::services::auth::dpop::{VerifiedProof, verify_proof_at};
use crate::services::auth::error::PopError;
use crate::services::auth::keys::KeyMaterial;
use crate::services::auth::token_issuer::Claims;

/// Claims of an access token whose `cnf.jkt` matched the proof presented with
/// it. `claims` no longer contains `cnf`.
#[derive(Debug, Clone)]
pub struct BoundClaims {
    pub claims: Claims,
    pub jkt: String,
    pub proof: VerifiedProof,
}

impl BoundClaims {
    pub fn sub(&self) -> Option<String> {
        match self.claims.get("sub")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// ES256 access-token verifier.
///
/// Debug never prints key material.
#[derive(Clone)]
pub struct TokenValidator {
    keys: Arc<KeyMaterial>,
    validation: Validation,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenValidator {
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        let mut validation = Validation::new(Algorithm::ES256);
        // `exp` is required (default) and checked against now with no grace.
        validation.leeway = 0;
        validation.validate_aud = false;

        Self { keys, validation }
    }

    /// Signature + `exp` only.
    pub fn verify(&self, token: &str) -> Result<Claims, PopError> {
        jsonwebtoken::decode::<Claims>(token, self.keys.decoding_key(), &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => PopError::TokenExpired,
                _ => {
                    debug!(error = %e, "access token rejected");
                    PopError::TokenInvalid
                }
            })
    }

    /// Full check for a protected request:
    /// 1) the proof, bound to this method/URI
    /// 2) the token signature and expiry
    /// 3) `cnf.jkt` == thumbprint of the proof key
    pub fn admit(
        &self,
        access_token: &str,
        proof: &str,
        method: &str,
        uri: &str,
    ) -> Result<BoundClaims, PopError> {
        self.admit_at(access_token, proof, method, uri, chrono::Utc::now().timestamp())
    }

    pub fn admit_at(
        &self,
        access_token: &str,
        proof: &str,
        method: &str,
        uri: &str,
        now: i64,
    ) -> Result<BoundClaims, PopError> {
        let proof = verify_proof_at(proof, method, uri, now)?;
        let claims = self.verify(access_token)?;
        bind(claims, proof)
    }
}

/// Steps 3 and 4: require `cnf.jkt` to equal the proof key thumbprint, then
/// strip `cnf` from what the caller sees.
pub fn bind(mut claims: Claims, proof: VerifiedProof) -> Result<BoundClaims, PopError> {
    let thumbprint = proof.thumbprint();

    let bound_jkt = claims
        .get("cnf")
        .and_then(|cnf| cnf.get("jkt"))
        .and_then(serde_json::Value::as_str);

    let matches = bound_jkt.is_some_and(|jkt| {
        jkt.len() == thumbprint.len() && bool::from(jkt.as_bytes().ct_eq(thumbprint.as_bytes()))
    });
    if !matches {
        warn!(jti = %proof.jti(), "access token is not bound to the DPoP proof key");
        return Err(PopError::TokenNotBound);
    }

    claims.remove("cnf");

    Ok(BoundClaims {
        claims,
        jkt: thumbprint,
        proof,
    })
}
