use axum::http::StatusCode;
use thiserror::Error;

/// Every way a proof or a bound access token can be rejected.
///
/// `Display` is the client-facing message, so variants never carry key
/// material, token contents or crypto backend details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    // startup
    #[error("Required key files are missing")]
    KeyMaterialMissing,
    #[error("Key files could not be parsed")]
    KeyMaterialInvalid,

    // structural
    #[error("Missing DPoP proof")]
    MissingProof,
    #[error("Invalid DPoP proof format")]
    MalformedEncoding,
    #[error("Invalid token parts in DPoP proof")]
    MalformedProof,
    #[error("Missing JWK in header")]
    MissingKey,
    #[error("Missing required claims in proof")]
    MissingClaims,

    // claim semantics
    #[error("HTTP method mismatch in proof")]
    MethodMismatch,
    #[error("URI mismatch in proof")]
    UriMismatch,
    #[error("Proof timestamp is outdated")]
    StaleProof,
    #[error("DPoP proof has expired")]
    ProofExpired,
    #[error("DPoP proof has already been used")]
    ProofReplayed,

    // cryptographic
    #[error("Invalid JWK format detected")]
    InvalidKeyFormat,
    #[error("Signature verification failed")]
    SignatureInvalid,
    #[error("Invalid signature length detected")]
    InvalidSignatureLength,

    // token lifecycle
    #[error("Invalid access token provided")]
    TokenInvalid,
    #[error("Token not bound to DPoP key")]
    TokenNotBound,
    #[error("Failed to create access token")]
    TokenIssuanceFailed,
    #[error("Access token has expired")]
    TokenExpired,
    #[error("Replay protection unavailable")]
    ReplayBackend,
}

impl PopError {
    /// Stable numeric code returned to clients.
    pub fn code(&self) -> u16 {
        match self {
            Self::KeyMaterialMissing => 100,
            Self::MissingProof => 101,
            Self::KeyMaterialInvalid => 102,
            Self::MalformedEncoding => 140,
            Self::MalformedProof => 141,
            Self::MissingKey => 142,
            Self::MissingClaims => 145,
            Self::MethodMismatch => 146,
            Self::UriMismatch => 147,
            Self::StaleProof => 148,
            Self::ProofExpired => 149,
            Self::ProofReplayed => 150,
            Self::InvalidKeyFormat => 160,
            Self::SignatureInvalid => 161,
            Self::InvalidSignatureLength => 163,
            Self::TokenInvalid => 180,
            Self::TokenNotBound => 181,
            Self::TokenIssuanceFailed => 183,
            Self::TokenExpired => 186,
            Self::ReplayBackend => 190,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidKeyFormat | Self::InvalidSignatureLength => StatusCode::BAD_REQUEST,
            Self::KeyMaterialMissing
            | Self::KeyMaterialInvalid
            | Self::TokenIssuanceFailed
            | Self::ReplayBackend => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}
