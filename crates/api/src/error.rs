//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use quill_core::media::MediaError;
use quill_core::site_config::SiteConfigError;
use quill_shared::AppError;

/// Handler error rendered as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        }
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.message(),
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        Self(err.into())
    }
}

impl From<SiteConfigError> for ApiError {
    fn from(err: SiteConfigError) -> Self {
        Self(match err {
            SiteConfigError::Source(msg) => AppError::Database(msg),
            other => AppError::Internal(other.to_string()),
        })
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
