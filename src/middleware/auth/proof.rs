//! DPoP proof 検証 (login-bind 経路) → VerifiedProof を extensions に入れる
//!
//! access token はまだ存在しないので、ここでは proof の検証とリプレイ確認のみ。
//! handler は `Extension<VerifiedProof>` を受け取り、その鍵に紐づく token を発行する。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::middleware::auth::{check_replay, dpop_header, request_uri::request_htu};
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, login_proof_middleware))
}

async fn login_proof_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let htu = request_htu(&req, state.public_base_url.as_deref());

    let verified = state.pop.admit_login_proof(
        dpop_header(req.headers())?,
        req.method().as_str(),
        &htu,
    )?;
    check_replay(&state, &verified).await?;

    req.extensions_mut().insert(verified);

    Ok(next.run(req).await)
}
