/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - PopError / JSON rejection を統一的に変換
 */
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::PopError;

pub const CODE_REQUIRED_PARAMETER_MISSING: u16 = 402;
pub const CODE_JSON_FORMAT: u16 = 431;
pub const CODE_INTERNAL: u16 = 500;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: u16, message: String },
    #[error(transparent)]
    Pop(#[from] PopError),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: u16, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn missing_parameter(name: &str) -> Self {
        Self::bad_request(
            CODE_REQUIRED_PARAMETER_MISSING,
            format!("Required parameter missing: {name}"),
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        tracing::debug!(error = %e, "request body rejected");
        Self::bad_request(CODE_JSON_FORMAT, "JSON format error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Pop(e) => (e.status(), e.code(), e.to_string()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                CODE_INTERNAL,
                "Internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}
