//! Site configuration errors.

use thiserror::Error;

/// Failures while loading or syncing site configuration.
#[derive(Debug, Error)]
pub enum SiteConfigError {
    /// Persisted cache could not be read or written.
    #[error("config cache error: {0}")]
    Cache(String),

    /// Authoritative source failed.
    #[error("config source error: {0}")]
    Source(String),

    /// Change-event stream failed.
    #[error("config event stream error: {0}")]
    Events(String),

    /// Payload could not be decoded.
    #[error("invalid config payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<std::io::Error> for SiteConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Cache(err.to_string())
    }
}
