//! Storage configuration types.

use std::time::Duration;

use quill_shared::config::{StorageProvider, StorageSettings};

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Per-request timeout for remote providers.
    pub timeout: Duration,
    /// `User-Agent` sent to remote providers.
    pub user_agent: String,
}

impl StorageConfig {
    /// Default request timeout: 30 seconds.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            timeout: Self::DEFAULT_TIMEOUT,
            user_agent: concat!("quill/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Build from the application settings section.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(settings.provider.clone()).with_timeout(Duration::from_secs(settings.timeout_secs))
    }

    /// Set request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
