//! access token (JWT + DPoP) 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: DPoP <token>` (互換のため `Bearer` も受け付ける)
//! - `DPoP: <proof>` を method / htu に対して検証し、`cnf.jkt` と鍵指紋の一致を確認
//! - 検証済み proof の jti をリプレイ対策ストアに記録

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::middleware::auth::{check_replay, dpop_header, request_uri::request_htu};
use crate::services::auth::PopError;
use crate::state::AppState;

/// 保護したい Router に DPoP 認証を掛ける。
///
/// 例：
/// ```ignore
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

/// `DPoP <token>` / `Bearer <token>`. The scheme is case-insensitive.
fn access_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    let known = scheme.eq_ignore_ascii_case("dpop") || scheme.eq_ignore_ascii_case("bearer");
    (known && !token.is_empty()).then_some(token)
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let htu = request_htu(&req, state.public_base_url.as_deref());

    let bound = state.pop.admit_bound_request(
        access_token(req.headers()),
        dpop_header(req.headers())?,
        req.method().as_str(),
        &htu,
    )?;
    check_replay(&state, &bound.proof).await?;

    let sub = bound.sub().ok_or_else(|| {
        tracing::warn!("access token has no subject");
        PopError::TokenInvalid
    })?;

    // middleware → extractor への受け渡し
    req.extensions_mut()
        .insert(AuthCtx::new(sub, bound.jkt, bound.claims));

    Ok(next.run(req).await)
}
