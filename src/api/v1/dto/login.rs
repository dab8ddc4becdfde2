use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for `/auth/line_login`.
///
/// The identity fields are taken as given; verifying them against the
/// identity provider happens before this service is called.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub sub: Option<String>,
    pub username: Option<String>,
}

impl LoginRequest {
    /// Both fields, trimmed and non-empty.
    pub fn into_parts(self) -> Result<(String, String), AppError> {
        let required = |value: Option<String>, name: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::missing_parameter(name))
        };

        Ok((required(self.sub, "sub")?, required(self.username, "username")?))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "DPoP"
    pub token_type: String,
    /// Seconds until expiry.
    pub expires_in: u64,
}
