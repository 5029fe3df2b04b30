//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity provider token configuration.
    pub jwt: JwtConfig,
    /// Object store configuration.
    pub storage: StorageSettings,
    /// CDN mirror configuration.
    pub cdn: CdnConfig,
    /// Upload limits.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Site config synchronization.
    #[serde(default)]
    pub site_config: SiteConfigSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Token verification settings for the external identity provider.
///
/// The provider signs access tokens with a shared HS256 secret.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Shared signing secret.
    pub secret: String,
    /// Expected `aud` claim, if the provider sets one.
    #[serde(default = "default_audience")]
    pub audience: Option<String>,
    /// Clock skew tolerance in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
    /// Lifetime of tokens minted by [`crate::JwtService::issue`] (tooling and tests).
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

#[allow(clippy::unnecessary_wraps)]
fn default_audience() -> Option<String> {
    Some("authenticated".to_string())
}

fn default_leeway() -> u64 {
    30
}

fn default_access_token_expiry() -> u64 {
    3600
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            audience: default_audience(),
            leeway_secs: default_leeway(),
            access_token_expiry_secs: default_access_token_expiry(),
        }
    }
}

/// Object store backend selection.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// GitHub contents API: every object is a commit on `branch`.
    #[serde(rename = "github")]
    GitHub {
        /// API base, e.g. `https://api.github.com`.
        #[serde(default = "default_github_api")]
        api_base: String,
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
        /// Branch objects are committed to.
        #[serde(default = "default_branch")]
        branch: String,
        /// Static bearer credential.
        token: String,
    },
    /// Local filesystem (development only).
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory (tests and demos).
    Memory,
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

impl StorageProvider {
    /// Get the provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GitHub { .. } => "github",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Object store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend.
    pub provider: StorageProvider,
    /// Per-request timeout for the remote content API.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

/// CDN mirror settings.
///
/// `owner`, `repo` and `branch` fall back to the GitHub provider's values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CdnConfig {
    /// Mirror origin, e.g. `cdn.jsdelivr.net/gh`.
    pub origin: String,
    /// Repository owner segment.
    #[serde(default)]
    pub owner: Option<String>,
    /// Repository name segment.
    #[serde(default)]
    pub repo: Option<String>,
    /// Branch segment.
    #[serde(default)]
    pub branch: Option<String>,
}

impl CdnConfig {
    /// Returns `(owner, repo, branch)`, filling gaps from the storage provider.
    #[must_use]
    pub fn segments(&self, provider: &StorageProvider) -> (String, String, String) {
        let (p_owner, p_repo, p_branch) = match provider {
            StorageProvider::GitHub {
                owner,
                repo,
                branch,
                ..
            } => (owner.as_str(), repo.as_str(), branch.as_str()),
            _ => ("", "", ""),
        };
        (
            self.owner.clone().unwrap_or_else(|| p_owner.to_string()),
            self.repo.clone().unwrap_or_else(|| p_repo.to_string()),
            self.branch.clone().unwrap_or_else(|| p_branch.to_string()),
        )
    }
}

/// Upload validation limits.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed MIME types.
    #[serde(default = "default_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl UploadConfig {
    /// Default max file size: 5MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

    /// Check if a MIME type is allowed.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(mime_type))
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_mime_types: default_mime_types(),
        }
    }
}

fn default_max_file_size() -> u64 {
    UploadConfig::DEFAULT_MAX_FILE_SIZE
}

fn default_mime_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/gif", "image/webp", "image/svg+xml"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Site config cache and change-feed settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfigSettings {
    /// Where the last known config snapshot is persisted.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    /// Postgres NOTIFY channel carrying change events.
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/site-config.json")
}

fn default_channel() -> String {
    "site_config_changes".to_string()
}

impl Default for SiteConfigSettings {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            channel: default_channel(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("QUILL").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
