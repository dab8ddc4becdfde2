/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が DPoP 検証後に request extensions に格納し、handler はこの型だけを受け取る
 */

use crate::services::auth::Claims;

/// DPoP で認証済みのリクエストに付与されるコンテキスト
///
/// - `sub` は access token の subject
/// - `jkt` はこのリクエストの proof 鍵の指紋 (= token の `cnf.jkt`)
/// - `claims` は `cnf` を除いた token の claims
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub sub: String,
    pub jkt: String,
    pub claims: Claims,
}

impl AuthCtx {
    pub fn new(sub: String, jkt: String, claims: Claims) -> Self {
        Self { sub, jkt, claims }
    }

    pub fn username(&self) -> Option<&str> {
        self.claims.get("username").and_then(|v| v.as_str())
    }
}
