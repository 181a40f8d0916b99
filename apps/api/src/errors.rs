use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ai::AiError;
use crate::render::RenderError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant carries a stable machine-readable code so clients can
/// branch on kind instead of parsing messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid version label: {0}")]
    InvalidVersion(String),

    #[error("Invalid config: {0}")]
    ConfigInvalid(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Compilation timed out")]
    CompileTimeout,

    #[error("Compilation failed: {0}")]
    CompileFailed(String),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, "ALREADY_EXISTS", msg.clone()),
            AppError::InvalidVersion(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_VERSION",
                msg.clone(),
            ),
            AppError::ConfigInvalid(msg) => {
                (StatusCode::BAD_REQUEST, "CONFIG_INVALID", msg.clone())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::CompileTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "COMPILE_TIMEOUT",
                "PDF compilation timed out".to_string(),
            ),
            AppError::CompileFailed(detail) => {
                tracing::error!("Compilation failed: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPILE_FAILED",
                    detail.clone(),
                )
            }
            AppError::Ai(err) => {
                let (status, code) = match err {
                    AiError::Auth(_) => (StatusCode::UNAUTHORIZED, "AI_AUTH"),
                    AiError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "AI_RATE_LIMITED"),
                    _ => (StatusCode::BAD_GATEWAY, "AI_ERROR"),
                };
                tracing::error!("AI error: {err}");
                (status, code, err.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(msg) => AppError::AlreadyExists(msg),
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::InvalidVersion(label) => AppError::InvalidVersion(label),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Timeout => AppError::CompileTimeout,
            RenderError::Failed { detail } => AppError::CompileFailed(detail),
            RenderError::Io(e) => AppError::Internal(anyhow::Error::new(e).context("render I/O")),
        }
    }
}
