//! Media pipeline error types.

use quill_shared::AppError;
use thiserror::Error;

use super::repository::RepositoryError;
use crate::storage::StorageError;

/// Machine-checkable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing was touched.
    Validation,
    /// Gate rejection; nothing was touched.
    Unauthorized,
    /// Object store write or delete failed.
    Upload,
    /// Repository operation failed.
    Database,
    /// Referenced record or object is absent.
    NotFound,
}

/// Media operation errors.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Input rejected before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Request not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Object store operation failed.
    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),

    /// Repository operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Record or object not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl MediaError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// The error's category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Upload(_) => ErrorKind::Upload,
            Self::Database(_) => ErrorKind::Database,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

impl From<RepositoryError> for MediaError {
    fn from(err: RepositoryError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Validation(msg) => Self::Validation(msg),
            MediaError::Unauthorized(msg) => Self::Unauthorized(msg),
            MediaError::Upload(e) => Self::ExternalService(e.to_string()),
            MediaError::Database(msg) => Self::Database(msg),
            MediaError::NotFound(msg) => Self::NotFound(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(MediaError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(
            MediaError::Unauthorized("x".into()).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            MediaError::from(StorageError::remote(500, "boom")).kind(),
            ErrorKind::Upload
        );
        assert_eq!(
            MediaError::from(RepositoryError::other("down")).kind(),
            ErrorKind::Database
        );
        assert_eq!(MediaError::not_found("x").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = MediaError::from(StorageError::remote(409, "sha mismatch")).into();
        assert_eq!(app.status_code(), 502);
        assert!(app.message().contains("sha mismatch"));

        let app: AppError = MediaError::validation("too big").into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");
    }
}
