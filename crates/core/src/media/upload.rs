//! Upload orchestration: validate, commit the object, record it.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::BoxFuture;
use quill_shared::config::UploadConfig;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::MediaError;
use super::path::{PathParams, derive_path, file_extension};
use super::repository::{MediaRepository, RepositoryError};
use super::saga::Saga;
use super::types::{MediaRecord, MediaType, NewMediaRecord, UploadInput, UploadResult};
use crate::storage::{CdnResolver, ObjectStore};

/// Source of the upload date used in storage keys.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current UTC date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Turns raw uploads into committed objects plus media records.
///
/// The object write is undone if the record cannot be stored, so a failed
/// upload leaves no record and, on a best-effort basis, no object.
pub struct UploadOrchestrator<S: ObjectStore, R: MediaRepository> {
    store: Arc<S>,
    repo: Arc<R>,
    cdn: CdnResolver,
    config: UploadConfig,
    clock: Arc<dyn Clock>,
}

impl<S: ObjectStore, R: MediaRepository> fmt::Debug for UploadOrchestrator<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("cdn", &self.cdn)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<S: ObjectStore + 'static, R: MediaRepository> UploadOrchestrator<S, R> {
    /// Create an orchestrator on the system clock.
    #[must_use]
    pub fn new(store: Arc<S>, repo: Arc<R>, cdn: CdnResolver, config: UploadConfig) -> Self {
        Self {
            store,
            repo,
            cdn,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Upload a file.
    ///
    /// # Errors
    ///
    /// - `Validation` if the MIME type, size, extension or owner is unacceptable;
    ///   nothing is written.
    /// - `Upload` if the object store rejects the write; no record exists.
    /// - `Database` if the record cannot be stored; the object write is undone.
    #[instrument(
        skip(self, input),
        fields(media_type = input.media_type.as_str(), size = input.data.len())
    )]
    pub async fn upload(&self, input: UploadInput) -> Result<UploadResult, MediaError> {
        let extension = self.validate(&input)?;
        let object_id = Uuid::new_v4();
        let path = derive_path(&PathParams {
            media_type: input.media_type,
            owner_id: input.owner_id.as_deref(),
            context_id: input.context_id.as_deref(),
            extension: &extension,
            date: self.clock.today(),
            object_id,
        })?;
        let url = self.cdn.resolve(&path);
        let size = i64::try_from(input.data.len())
            .map_err(|_| MediaError::validation("file too large"))?;

        let mut saga = Saga::new("upload");

        let store = Arc::clone(&self.store);
        let undo_path = path.clone();
        saga.step_with_undo(
            "object_write",
            async {
                self.store
                    .put(&path, input.data.clone(), &format!("upload {path}"))
                    .await
                    .map_err(MediaError::from)
            },
            move || -> BoxFuture<'static, Result<(), MediaError>> {
                Box::pin(async move {
                    store
                        .delete(&undo_path, &format!("rollback {undo_path}"))
                        .await
                        .map(|_| ())
                        .map_err(MediaError::from)
                })
            },
        )
        .await?;

        let new_record = NewMediaRecord {
            filename: input.filename.clone(),
            url: url.clone(),
            path: path.clone(),
            size,
            category: input.media_type.record_category().to_string(),
        };
        let record = saga
            .step(
                "record_insert",
                self.insert_record(new_record, input.media_type),
            )
            .await?;

        info!(id = %record.id, path = %path, category = %record.category, "Media uploaded");
        Ok(UploadResult {
            id: record.id,
            url,
            path,
        })
    }

    /// Check the input and pick the file extension.
    fn validate(&self, input: &UploadInput) -> Result<String, MediaError> {
        let essence = input
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        if !self.config.is_mime_type_allowed(essence) {
            return Err(MediaError::validation(format!(
                "unsupported file type: {}",
                input.content_type
            )));
        }
        if input.data.is_empty() {
            return Err(MediaError::validation("file is empty"));
        }
        if input.data.len() as u64 > self.config.max_file_size {
            return Err(MediaError::validation(format!(
                "file exceeds {} bytes",
                self.config.max_file_size
            )));
        }
        if input.media_type == MediaType::Avatar
            && input.owner_id.as_deref().is_none_or(|o| o.trim().is_empty())
        {
            return Err(MediaError::validation("avatar uploads require an owner id"));
        }
        file_extension(&input.filename, essence)
            .ok_or_else(|| MediaError::validation("cannot determine file extension"))
    }

    /// Insert the record, retrying once with the fallback category if the
    /// schema rejects the first one.
    async fn insert_record(
        &self,
        record: NewMediaRecord,
        media_type: MediaType,
    ) -> Result<MediaRecord, MediaError> {
        match self.repo.insert(record.clone()).await {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::CategoryRejected(reason)) => {
                let fallback = media_type.fallback_category();
                warn!(
                    category = %record.category,
                    fallback,
                    reason = %reason,
                    "Category rejected, retrying insert"
                );
                let retry = NewMediaRecord {
                    category: fallback.to_string(),
                    ..record
                };
                Ok(self.repo.insert(retry).await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}
