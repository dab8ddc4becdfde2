/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は認証なし
 * - /auth/line_login は DPoP proof のみ、/auth/profile 以降は access token + proof
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    auth::{line_login, profile},
    health::health,
};
use crate::middleware::auth::{access, proof};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let login = proof::apply(
        Router::new().route("/auth/line_login", post(line_login)),
        state.clone(),
    );

    let protected = access::apply(Router::new().route("/auth/profile", get(profile)), state);

    Router::new()
        .route("/health", get(health))
        .merge(login)
        .merge(protected)
}
