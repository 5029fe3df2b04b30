//! Batch deletion across the object store and the repository.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::MediaError;
use super::repository::MediaRepository;
use super::types::{DeleteReport, ObjectFailure};
use crate::storage::{DeleteOutcome, ObjectStore};

/// Removes media in two independent phases: objects first, then records.
///
/// Object failures are logged and reported but never stop the batch, so a
/// record may be gone while its object lingers in the store.
#[derive(Debug)]
pub struct DeleteOrchestrator<S: ObjectStore, R: MediaRepository> {
    store: Arc<S>,
    repo: Arc<R>,
}

impl<S: ObjectStore, R: MediaRepository> DeleteOrchestrator<S, R> {
    /// Create a delete orchestrator.
    #[must_use]
    pub fn new(store: Arc<S>, repo: Arc<R>) -> Self {
        Self { store, repo }
    }

    /// Delete the given records and their objects.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty id list.
    /// - `NotFound` if none of the ids has a record.
    /// - `Database` if the lookup or the row deletion fails.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete(&self, ids: &[Uuid]) -> Result<DeleteReport, MediaError> {
        if ids.is_empty() {
            return Err(MediaError::validation("no media ids given"));
        }

        let records = self.repo.find_by_ids(ids).await?;
        if records.is_empty() {
            return Err(MediaError::not_found("none of the media ids exist"));
        }

        let found: HashSet<Uuid> = records.iter().map(|r| r.id).collect();
        for id in ids.iter().filter(|id| !found.contains(id)) {
            warn!(%id, "Media record not found, skipping");
        }

        let mut report = DeleteReport::default();
        for record in &records {
            let message = format!("delete {}", record.path);
            match self.store.delete(&record.path, &message).await {
                Ok(DeleteOutcome::Deleted) => report.objects_deleted += 1,
                Ok(DeleteOutcome::AlreadyAbsent) => {
                    warn!(id = %record.id, path = %record.path, "Object already absent");
                    report.objects_missing += 1;
                }
                Err(e) => {
                    warn!(id = %record.id, path = %record.path, error = %e, "Object delete failed");
                    report.object_failures.push(ObjectFailure {
                        id: record.id,
                        path: record.path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let existing: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        report.records_deleted = self.repo.delete_many(&existing).await?;

        info!(
            records = report.records_deleted,
            objects = report.objects_deleted,
            missing = report.objects_missing,
            failed = report.object_failures.len(),
            "Media deleted"
        );
        Ok(report)
    }
}
