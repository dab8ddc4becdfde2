use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::json;

use crate::api::v1::dto::login::{LoginRequest, TokenResponse};
use crate::api::v1::dto::profile::ProfileResponse;
use crate::api::v1::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::services::auth::Claims;
use crate::services::auth::dpop::VerifiedProof;
use crate::state::AppState;

/// `POST /auth/line_login`: the proof was admitted by the middleware; bind a
/// fresh access token to its key.
pub async fn line_login(
    State(state): State<AppState>,
    Extension(proof): Extension<VerifiedProof>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let Json(req) = body?;
    let (sub, username) = req.into_parts()?;

    let mut claims = Claims::new();
    claims.insert("sub".into(), json!(sub));
    claims.insert("username".into(), json!(username));
    claims.insert("type".into(), json!("access"));

    let issued = state.pop.issue(claims, &proof)?;
    tracing::info!(sub = %sub, jkt = %issued.jkt, "access token issued");

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            expires_in: issued.expires_in(),
            access_token: issued.access_token,
            token_type: "DPoP".to_string(),
        }),
    ))
}

/// `GET /auth/profile`
pub async fn profile(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        username: ctx.username().map(str::to_string),
        sub: ctx.sub,
        jkt: ctx.jkt,
    })
}
