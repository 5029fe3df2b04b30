//! OpenDAL-backed object store for development and tests.

use std::path::Path;

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};

use super::error::StorageError;
use super::service::{DeleteOutcome, ObjectStore, ObjectVersion, StoredObject, validate_key};

/// Object store on a local directory or in process memory.
#[derive(Debug, Clone)]
pub struct OpendalStore {
    operator: Operator,
}

impl OpendalStore {
    /// Store rooted at a local directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not valid UTF-8 or the operator cannot be built.
    pub fn local_fs(root: &Path) -> Result<Self, StorageError> {
        let root = root
            .to_str()
            .ok_or_else(|| StorageError::configuration("invalid path"))?;
        let builder = services::Fs::default().root(root);
        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();
        Ok(Self { operator })
    }

    /// Store held in process memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built.
    pub fn memory() -> Result<Self, StorageError> {
        let operator = Operator::new(services::Memory::default())
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();
        Ok(Self { operator })
    }

    /// Read an object back.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing is stored under `path`.
    pub async fn read(&self, path: &str) -> Result<Bytes, StorageError> {
        validate_key(path)?;
        let buffer = self.operator.read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::not_found(path),
            _ => StorageError::from(e),
        })?;
        Ok(buffer.to_bytes())
    }
}

impl ObjectStore for OpendalStore {
    async fn stat(&self, path: &str) -> Result<Option<ObjectVersion>, StorageError> {
        validate_key(path)?;
        match self.operator.stat(path).await {
            Ok(meta) => Ok(Some(ObjectVersion {
                path: path.to_string(),
                sha: meta
                    .etag()
                    .map_or_else(|| format!("len-{}", meta.content_length()), str::to_string),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    async fn put(&self, path: &str, data: Bytes, _message: &str) -> Result<StoredObject, StorageError> {
        validate_key(path)?;
        self.operator.write(path, data).await?;
        Ok(StoredObject {
            path: path.to_string(),
            sha: None,
        })
    }

    async fn delete(&self, path: &str, _message: &str) -> Result<DeleteOutcome, StorageError> {
        if self.stat(path).await?.is_none() {
            return Ok(DeleteOutcome::AlreadyAbsent);
        }
        self.operator.delete(path).await?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = OpendalStore::memory().unwrap();
        assert_eq!(store.stat("site/a.png").await.unwrap(), None);

        store
            .put("site/a.png", Bytes::from_static(b"abc"), "upload")
            .await
            .unwrap();
        assert_eq!(store.read("site/a.png").await.unwrap(), Bytes::from_static(b"abc"));
        assert!(store.stat("site/a.png").await.unwrap().is_some());

        assert_eq!(
            store.delete("site/a.png", "delete").await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete("site/a.png", "delete").await.unwrap(),
            DeleteOutcome::AlreadyAbsent
        );
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let store = OpendalStore::memory().unwrap();
        store
            .put("avatars/u.png", Bytes::from_static(b"one"), "upload")
            .await
            .unwrap();
        store
            .put("avatars/u.png", Bytes::from_static(b"two"), "upload")
            .await
            .unwrap();
        assert_eq!(store.read("avatars/u.png").await.unwrap(), Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn test_local_fs_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = OpendalStore::local_fs(dir.path()).unwrap();
        store
            .put("posts/draft-20260115/x.png", Bytes::from_static(b"img"), "upload")
            .await
            .unwrap();
        assert!(dir.path().join("posts/draft-20260115/x.png").exists());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let store = OpendalStore::memory().unwrap();
        let err = store.read("site/none.png").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
