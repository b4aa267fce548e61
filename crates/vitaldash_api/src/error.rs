//! API error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use vitaldash_engine::EngineError;

/// End-user facing message for any backend failure. The product surface is
/// Vietnamese; internals are logged in full before the response is built.
pub const INTERNAL_ERROR_MESSAGE: &str = "Lỗi hệ thống, vui lòng thử lại sau";

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("missing user identity")]
    Unauthenticated,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Engine(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": INTERNAL_ERROR_MESSAGE })),
                )
                    .into_response()
            }
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthorized" })),
            )
                .into_response(),
        }
    }
}

/// Result type alias for handler bodies.
pub type ApiResult<T> = Result<T, ApiError>;
