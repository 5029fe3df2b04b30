//! Media library service.

use std::sync::Arc;

use quill_shared::config::UploadConfig;
use quill_shared::types::{PageRequest, PageResponse};
use uuid::Uuid;

use super::delete::DeleteOrchestrator;
use super::error::MediaError;
use super::repository::MediaRepository;
use super::types::{DeleteReport, MediaRecord, MediaType, UploadInput, UploadResult};
use super::upload::{Clock, UploadOrchestrator};
use crate::storage::{CdnResolver, ObjectStore};

/// Entry point for the media routes: upload, delete, browse.
#[derive(Debug)]
pub struct MediaService<S: ObjectStore + 'static, R: MediaRepository> {
    uploads: UploadOrchestrator<S, R>,
    deletes: DeleteOrchestrator<S, R>,
    repo: Arc<R>,
}

impl<S: ObjectStore + 'static, R: MediaRepository> MediaService<S, R> {
    /// Create a media service.
    #[must_use]
    pub fn new(store: Arc<S>, repo: Arc<R>, cdn: CdnResolver, config: UploadConfig) -> Self {
        Self {
            uploads: UploadOrchestrator::new(Arc::clone(&store), Arc::clone(&repo), cdn, config),
            deletes: DeleteOrchestrator::new(store, Arc::clone(&repo)),
            repo,
        }
    }

    /// Replace the clock used for upload dates.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.uploads = self.uploads.with_clock(clock);
        self
    }

    /// Upload a file.
    ///
    /// # Errors
    ///
    /// See [`UploadOrchestrator::upload`].
    pub async fn upload(&self, input: UploadInput) -> Result<UploadResult, MediaError> {
        self.uploads.upload(input).await
    }

    /// Delete records and their objects.
    ///
    /// # Errors
    ///
    /// See [`DeleteOrchestrator::delete`].
    pub async fn delete(&self, ids: &[Uuid]) -> Result<DeleteReport, MediaError> {
        self.deletes.delete(ids).await
    }

    /// Page through records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the repository fails.
    pub async fn list(
        &self,
        media_type: Option<MediaType>,
        page: PageRequest,
    ) -> Result<PageResponse<MediaRecord>, MediaError> {
        let page = page.normalized();
        let category = media_type.map(|t| t.filter_category());
        let (records, total) = self.repo.list(category, &page).await?;
        Ok(PageResponse::new(records, page.page, page.per_page, total))
    }

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such record.
    pub async fn get(&self, id: Uuid) -> Result<MediaRecord, MediaError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| MediaError::not_found(format!("media {id}")))
    }
}
