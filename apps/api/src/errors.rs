use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map};
use thiserror::Error;

/// Longest slice of raw generator output echoed back in an error body.
const MAX_RAW_IN_RESPONSE: usize = 4000;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Content generator failure: {message}")]
    UpstreamGeneratorFailure { message: String, retryable: bool },

    #[error("Content generator returned malformed output: {message}")]
    UpstreamGeneratorMalformed { message: String, raw: String },

    #[error("Render failure: {0}")]
    RenderFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UpstreamGeneratorFailure { retryable: true, .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::UpstreamGeneratorFailure { retryable: false, .. }
            | AppError::UpstreamGeneratorMalformed { .. } => StatusCode::BAD_GATEWAY,
            AppError::RenderFailure(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::UpstreamGeneratorFailure { .. } => "UPSTREAM_GENERATOR_FAILURE",
            AppError::UpstreamGeneratorMalformed { .. } => "UPSTREAM_GENERATOR_MALFORMED",
            AppError::RenderFailure(_) => "RENDER_FAILURE",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

/// Malformed or mistyped request bodies get the same error shape as every other
/// invalid input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut error = Map::new();
        error.insert("code".to_string(), json!(self.code()));

        match &self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                error.insert("message".to_string(), json!(msg));
            }
            AppError::UpstreamGeneratorFailure { message, retryable } => {
                tracing::error!("Content generator failure (retryable={retryable}): {message}");
                error.insert("message".to_string(), json!(message));
                error.insert("retryable".to_string(), json!(retryable));
            }
            AppError::UpstreamGeneratorMalformed { message, raw } => {
                tracing::error!("Content generator returned malformed output: {message}");
                let raw: String = raw.chars().take(MAX_RAW_IN_RESPONSE).collect();
                error.insert("message".to_string(), json!(message));
                error.insert("retryable".to_string(), json!(true));
                error.insert("details".to_string(), json!({ "raw": raw }));
            }
            AppError::RenderFailure(msg) => {
                tracing::error!("Render failure: {msg}");
                error.insert("message".to_string(), json!(format!("Render failure: {msg}")));
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                error.insert(
                    "message".to_string(),
                    json!("A storage error occurred"),
                );
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                error.insert(
                    "message".to_string(),
                    json!("An internal server error occurred"),
                );
            }
        }

        let body = Json(json!({ "error": error }));

        (status, body).into_response()
    }
}
