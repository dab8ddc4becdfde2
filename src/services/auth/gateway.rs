//! Entry points for the request pipeline.
//!
//! Each request moves through
//! `NoProof → ProofParsed → ProofVerified → (Issuing | TokenBound) → Admitted`
//! or stops at the first rejection. Nothing is carried between requests
//! except the immutable key pair.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::services::auth::access_jwt::{BoundClaims, TokenValidator};
use crate::services::auth::dpop::{VerifiedProof, verify_proof};
use crate::services::auth::error::PopError;
use crate::services::auth::keys::KeyMaterial;
use crate::services::auth::token_issuer::{Claims, IssuedToken, TokenIssuer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NoProof,
    ProofParsed,
    ProofVerified,
    Issuing,
    TokenBound,
    Admitted,
}

impl Stage {
    /// Last stage a request reached before `err` rejected it.
    pub fn reached_before(err: &PopError) -> Self {
        match err {
            PopError::KeyMaterialMissing
            | PopError::KeyMaterialInvalid
            | PopError::MissingProof
            | PopError::MalformedEncoding
            | PopError::MalformedProof
            | PopError::MissingKey
            | PopError::MissingClaims => Self::NoProof,
            PopError::MethodMismatch
            | PopError::UriMismatch
            | PopError::StaleProof
            | PopError::ProofExpired
            | PopError::InvalidKeyFormat
            | PopError::SignatureInvalid
            | PopError::InvalidSignatureLength => Self::ProofParsed,
            PopError::TokenInvalid
            | PopError::TokenExpired
            | PopError::TokenNotBound
            | PopError::ProofReplayed
            | PopError::ReplayBackend => Self::ProofVerified,
            PopError::TokenIssuanceFailed => Self::Issuing,
        }
    }
}

fn rejected(err: PopError, method: &str, uri: &str) -> PopError {
    warn!(
        stage = ?Stage::reached_before(&err),
        code = err.code(),
        error = %err,
        method,
        uri,
        "DPoP request rejected"
    );
    err
}

#[derive(Clone, Debug)]
pub struct PopGateway {
    issuer: TokenIssuer,
    validator: TokenValidator,
}

impl PopGateway {
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        Self {
            issuer: TokenIssuer::new(keys.clone()),
            validator: TokenValidator::new(keys),
        }
    }

    /// Login-bind path, step 1: prove possession of the key in the `DPoP` header.
    pub fn admit_login_proof(
        &self,
        proof: Option<&str>,
        method: &str,
        uri: &str,
    ) -> Result<VerifiedProof, PopError> {
        let proof = proof.ok_or_else(|| rejected(PopError::MissingProof, method, uri))?;
        let verified = verify_proof(proof, method, uri).map_err(|e| rejected(e, method, uri))?;

        debug!(stage = ?Stage::ProofVerified, jti = %verified.jti(), "login proof admitted");
        Ok(verified)
    }

    /// Login-bind path, step 2: mint a token bound to the verified key.
    pub fn issue(&self, claims: Claims, proof: &VerifiedProof) -> Result<IssuedToken, PopError> {
        self.issuer.issue(claims, proof).map_err(|e| {
            warn!(stage = ?Stage::Issuing, code = e.code(), error = %e, "token issuance failed");
            e
        })
    }

    /// Resource-access path: the proof, then the token, then the binding.
    pub fn admit_bound_request(
        &self,
        access_token: Option<&str>,
        proof: Option<&str>,
        method: &str,
        uri: &str,
    ) -> Result<BoundClaims, PopError> {
        let proof = proof.ok_or_else(|| rejected(PopError::MissingProof, method, uri))?;
        let Some(access_token) = access_token else {
            // proof errors still take precedence over the missing token
            verify_proof(proof, method, uri).map_err(|e| rejected(e, method, uri))?;
            return Err(rejected(PopError::TokenInvalid, method, uri));
        };

        let bound = self
            .validator
            .admit(access_token, proof, method, uri)
            .map_err(|e| rejected(e, method, uri))?;

        debug!(stage = ?Stage::TokenBound, jkt = %bound.jkt, "access token bound to proof key");
        debug!(stage = ?Stage::Admitted, "bound request admitted");
        Ok(bound)
    }
}
