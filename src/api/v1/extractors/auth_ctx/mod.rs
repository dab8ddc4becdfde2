/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - DPoP 検証済みリクエストのコンテキスト (AuthCtx) を handler に提供する
 * - axum 依存は core に、型定義は types に分離する
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
