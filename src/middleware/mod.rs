/*
 * Responsibility
 * - middleware の公開インターフェース
 * - http (横断的関心事), cors, auth (DPoP 検証)
 */
pub mod auth;
pub mod cors;
pub mod http;
