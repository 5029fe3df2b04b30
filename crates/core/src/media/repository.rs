//! Persistence contract for media records.

use std::future::Future;

use quill_shared::types::PageRequest;
use thiserror::Error;
use uuid::Uuid;

use super::types::{MediaRecord, NewMediaRecord};

/// Repository failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The stored category was refused by the table's category constraint.
    ///
    /// Adapters raise this instead of a generic failure so the upload
    /// pipeline can retry with a legacy category.
    #[error("category rejected by schema constraint: {0}")]
    CategoryRejected(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl RepositoryError {
    /// Create a generic repository error.
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Repository trait for media record persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait MediaRepository: Send + Sync {
    /// Insert a record; the repository assigns the id.
    fn insert(
        &self,
        record: NewMediaRecord,
    ) -> impl Future<Output = Result<MediaRecord, RepositoryError>> + Send;

    /// Find a record by ID.
    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<MediaRecord>, RepositoryError>> + Send;

    /// Find every record whose id is in `ids`. Unknown ids are skipped.
    fn find_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = Result<Vec<MediaRecord>, RepositoryError>> + Send;

    /// Delete every record whose id is in `ids` in one operation.
    ///
    /// Returns the number of rows removed.
    fn delete_many(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// List records, newest first, optionally filtered by stored category.
    ///
    /// Returns the page and the total number of matching records.
    fn list(
        &self,
        category: Option<&str>,
        page: &PageRequest,
    ) -> impl Future<Output = Result<(Vec<MediaRecord>, u64), RepositoryError>> + Send;
}
