use serde::{Deserialize, Serialize};

use crate::services::auth::dpop::codec::{base64url_decode, base64url_encode};
use crate::services::auth::error::PopError;

pub const JWK_KTY_EC: &str = "EC";
pub const JWK_CRV_P256: &str = "P-256";

/// DPoP proof JWT header. `jwk` is kept loosely typed until signature
/// verification decides whether it is a usable P-256 key.
#[derive(Debug, Clone, Deserialize)]
pub struct ProofHeader {
    #[serde(default)]
    pub typ: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub jwk: Option<serde_json::Value>,
}

/// Payload as it arrives on the wire; every member is optional so that
/// absence can be reported as `MissingClaims`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawProofClaims {
    pub htm: Option<String>,
    pub htu: Option<String>,
    pub jti: Option<String>,
    pub iat: Option<serde_json::Number>,
    pub exp: Option<serde_json::Number>,
}

/// NumericDate may carry a fraction; whole seconds are kept (floor).
fn numeric_date(value: serde_json::Number) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.floor() as i64)
    })
}

/// DPoP proof claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofClaims {
    pub htm: String,           // HTTP method
    pub htu: String,           // HTTP URI (absolute, no query)
    pub jti: String,           // unique proof ID
    pub iat: i64,              // issued at (unix timestamp)
    pub exp: i64,              // proof expiry (unix timestamp)
}

impl TryFrom<RawProofClaims> for ProofClaims {
    type Error = PopError;

    fn try_from(raw: RawProofClaims) -> Result<Self, Self::Error> {
        let iat = raw.iat.and_then(numeric_date);
        let exp = raw.exp.and_then(numeric_date);

        match (raw.htm, raw.htu, raw.jti, iat, exp) {
            (Some(htm), Some(htu), Some(jti), Some(iat), Some(exp)) => Ok(Self {
                htm,
                htu,
                jti,
                iat,
                exp,
            }),
            _ => Err(PopError::MissingClaims),
        }
    }
}

/// A client-presented EC public key `{kty, crv, x, y}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
}

impl EcJwk {
    pub fn p256(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            kty: JWK_KTY_EC.to_string(),
            crv: JWK_CRV_P256.to_string(),
            x: x.into(),
            y: y.into(),
        }
    }

    /// Accept only `kty = "EC"`, `crv = "P-256"` with string `x` and `y`.
    ///
    /// Coordinates are re-encoded as unpadded base64url so one key always
    /// has one thumbprint.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, PopError> {
        let field = |name: &str| value.get(name).and_then(serde_json::Value::as_str);

        match (field("kty"), field("crv"), field("x"), field("y")) {
            (Some(JWK_KTY_EC), Some(JWK_CRV_P256), Some(x), Some(y)) => {
                Ok(Self::p256(canonical_coordinate(x)?, canonical_coordinate(y)?))
            }
            _ => Err(PopError::InvalidKeyFormat),
        }
    }
}

fn canonical_coordinate(raw: &str) -> Result<String, PopError> {
    base64url_decode(raw)
        .map(base64url_encode)
        .map_err(|_| PopError::InvalidKeyFormat)
}

/// A proof that passed parsing, claim checks and signature verification.
///
/// Only `verify_proof` builds this, which is what lets token issuance demand
/// one as evidence that possession was proven first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProof {
    jwk: EcJwk,
    jti: String,
    iat: i64,
    exp: i64,
}

impl VerifiedProof {
    pub(super) fn new(jwk: EcJwk, claims: ProofClaims) -> Self {
        Self {
            jwk,
            jti: claims.jti,
            iat: claims.iat,
            exp: claims.exp,
        }
    }

    pub fn jwk(&self) -> &EcJwk {
        &self.jwk
    }

    pub fn jti(&self) -> &str {
        &self.jti
    }

    pub fn iat(&self) -> i64 {
        self.iat
    }

    pub fn exp(&self) -> i64 {
        self.exp
    }

    /// RFC 7638 thumbprint of the proof key.
    pub fn thumbprint(&self) -> String {
        super::thumbprint::jwk_thumbprint(&self.jwk)
    }
}
