use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Thumbprint of the key this request was bound to.
    pub jkt: String,
}
