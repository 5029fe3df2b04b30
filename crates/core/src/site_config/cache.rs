//! Persisted copy of the last known configuration.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

use super::error::SiteConfigError;
use super::types::ConfigMap;

/// Local persistence of the configuration map.
pub trait ConfigCache: Send + Sync {
    /// Load the cached map; `None` when nothing has been cached yet.
    fn load(&self) -> impl Future<Output = Result<Option<ConfigMap>, SiteConfigError>> + Send;

    /// Replace the cached map.
    fn save(&self, map: &ConfigMap) -> impl Future<Output = Result<(), SiteConfigError>> + Send;
}

/// JSON file cache.
///
/// Each write goes to its own uniquely named sibling temp file that is then
/// renamed over the target, so a crash mid-write leaves the previous cache
/// intact and concurrent writers never share a temp file.
#[derive(Debug, Clone)]
pub struct FileConfigCache {
    path: PathBuf,
}

impl FileConfigCache {
    /// Cache stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigCache for FileConfigCache {
    async fn load(&self) -> Result<Option<ConfigMap>, SiteConfigError> {
        match fs::read(&self.path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, map: &ConfigMap) -> Result<(), SiteConfigError> {
        let raw = serde_json::to_vec_pretty(map)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_replace(&path, &raw))
            .await
            .map_err(|e| SiteConfigError::Cache(e.to_string()))??;
        debug!(path = %self.path.display(), keys = map.len(), "Site config cached");
        Ok(())
    }
}

fn write_replace(path: &Path, raw: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(raw)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
