//! Object store abstraction and the configured backend.

use std::future::Future;

use bytes::Bytes;
use quill_shared::config::StorageProvider;
use tracing::info;

use super::config::StorageConfig;
use super::error::StorageError;
use super::github::GitHubContentStore;
use super::local::OpendalStore;

/// Current version of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    /// Storage key.
    pub path: String,
    /// Content hash (git blob sha for the content API, etag or length otherwise).
    pub sha: String,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Storage key.
    pub path: String,
    /// Content hash of the written object, when the backend reports one.
    pub sha: Option<String>,
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The object existed and was removed.
    Deleted,
    /// Nothing was stored under the path.
    AlreadyAbsent,
}

/// Read/write/delete access to the object store.
///
/// Writes are create-or-overwrite. Deletes of absent objects succeed with
/// [`DeleteOutcome::AlreadyAbsent`].
pub trait ObjectStore: Send + Sync {
    /// Look up the current version of an object, `None` when absent.
    fn stat(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<ObjectVersion>, StorageError>> + Send;

    /// Create or overwrite an object.
    fn put(
        &self,
        path: &str,
        data: Bytes,
        message: &str,
    ) -> impl Future<Output = Result<StoredObject, StorageError>> + Send;

    /// Delete an object.
    fn delete(
        &self,
        path: &str,
        message: &str,
    ) -> impl Future<Output = Result<DeleteOutcome, StorageError>> + Send;
}

/// The backend selected by configuration.
#[derive(Debug)]
pub enum StorageBackend {
    /// GitHub contents API.
    GitHub(GitHubContentStore),
    /// OpenDAL filesystem or memory.
    Local(OpendalStore),
}

impl StorageBackend {
    /// Create the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let backend = match &config.provider {
            StorageProvider::GitHub {
                api_base,
                owner,
                repo,
                branch,
                token,
            } => Self::GitHub(GitHubContentStore::new(
                api_base,
                owner,
                repo,
                branch,
                token,
                config,
            )?),
            StorageProvider::LocalFs { root } => Self::Local(OpendalStore::local_fs(root)?),
            StorageProvider::Memory => Self::Local(OpendalStore::memory()?),
        };
        info!(provider = config.provider.name(), "Object store initialized");
        Ok(backend)
    }
}

impl ObjectStore for StorageBackend {
    async fn stat(&self, path: &str) -> Result<Option<ObjectVersion>, StorageError> {
        match self {
            Self::GitHub(store) => store.stat(path).await,
            Self::Local(store) => store.stat(path).await,
        }
    }

    async fn put(&self, path: &str, data: Bytes, message: &str) -> Result<StoredObject, StorageError> {
        match self {
            Self::GitHub(store) => store.put(path, data, message).await,
            Self::Local(store) => store.put(path, data, message).await,
        }
    }

    async fn delete(&self, path: &str, message: &str) -> Result<DeleteOutcome, StorageError> {
        match self {
            Self::GitHub(store) => store.delete(path, message).await,
            Self::Local(store) => store.delete(path, message).await,
        }
    }
}

/// Reject keys that would escape the store root or address a directory.
pub(crate) fn validate_key(path: &str) -> Result<(), StorageError> {
    if path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(StorageError::InvalidKey(path.to_string()));
    }
    Ok(())
}
