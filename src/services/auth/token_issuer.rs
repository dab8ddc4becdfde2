use std::sync::Arc;

use jsonwebtoken::{Algorithm, Header};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::services::auth::dpop::VerifiedProof;
use crate::services::auth::error::PopError;
use crate::services::auth::keys::KeyMaterial;

/// Access tokens live exactly one hour.
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// Application claims carried by an access token.
pub type Claims = serde_json::Map<String, Value>;

/// A freshly signed access token and the values baked into it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub jkt: String,
    pub iat: i64,
    pub exp: i64,
}

impl IssuedToken {
    pub fn expires_in(&self) -> u64 {
        u64::try_from(self.exp - self.iat).unwrap_or(0)
    }
}

/// Mints ES256 access tokens bound (`cnf.jkt`) to a proven client key.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    keys: Arc<KeyMaterial>,
}

impl TokenIssuer {
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        Self { keys }
    }

    /// Issue an access token.
    ///
    /// Taking a `VerifiedProof` means a token can only follow a successful
    /// `verify_proof`. `cnf`, `iat` and `exp` in `claims` are overwritten.
    pub fn issue(&self, claims: Claims, proof: &VerifiedProof) -> Result<IssuedToken, PopError> {
        self.issue_at(claims, proof, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(
        &self,
        mut claims: Claims,
        proof: &VerifiedProof,
        now: i64,
    ) -> Result<IssuedToken, PopError> {
        let jkt = proof.thumbprint();
        let exp = now + ACCESS_TOKEN_TTL_SECONDS;

        claims.insert("cnf".to_string(), json!({ "jkt": jkt }));
        claims.insert("iat".to_string(), Value::from(now));
        claims.insert("exp".to_string(), Value::from(exp));

        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("JWT".to_string());

        let access_token = jsonwebtoken::encode(&header, &claims, self.keys.encoding_key())
            .map_err(|e| {
                error!(error = %e, "failed to sign access token");
                PopError::TokenIssuanceFailed
            })?;

        debug!(jkt = %jkt, exp, "issued DPoP-bound access token");

        Ok(IssuedToken {
            access_token,
            jkt,
            iat: now,
            exp,
        })
    }
}
