//! Media repository for database operations.
//!
//! Implements media record persistence using SeaORM.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::media;
use quill_core::media::{
    MediaRecord, MediaRepository as MediaRepoTrait, NewMediaRecord, RepositoryError,
};
use quill_shared::types::PageRequest;

/// Name of the check constraint on `media.type`.
pub const CATEGORY_CONSTRAINT: &str = "media_type_check";

/// Media repository implementation.
#[derive(Debug, Clone)]
pub struct MediaRepository {
    db: DatabaseConnection,
}

impl MediaRepository {
    /// Create a new media repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl MediaRepoTrait for MediaRepository {
    async fn insert(&self, record: NewMediaRecord) -> Result<MediaRecord, RepositoryError> {
        let active_model = media::ActiveModel {
            id: Set(Uuid::now_v7()),
            filename: Set(record.filename),
            url: Set(record.url),
            path: Set(record.path),
            size: Set(record.size),
            media_type: Set(record.category),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model.insert(&self.db).await.map_err(classify)?;
        debug!(id = %model.id, path = %model.path, "Media record inserted");

        Ok(to_domain(model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MediaRecord>, RepositoryError> {
        let model = media::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(classify)?;

        Ok(model.map(to_domain))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MediaRecord>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = media::Entity::find()
            .filter(media::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(classify)?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = media::Entity::delete_many()
            .filter(media::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected)
    }

    async fn list(
        &self,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<(Vec<MediaRecord>, u64), RepositoryError> {
        let mut query = media::Entity::find();
        if let Some(category) = category {
            query = query.filter(media::Column::MediaType.eq(category));
        }

        let total = query.clone().count(&self.db).await.map_err(classify)?;
        let models = query
            .order_by_desc(media::Column::CreatedAt)
            .order_by_desc(media::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(classify)?;

        Ok((models.into_iter().map(to_domain).collect(), total))
    }
}

/// Map a database error, flagging category check violations.
///
/// Postgres reports the violated constraint by name in the error text; there
/// is no structured code for check constraints in `DbErr`.
fn classify(err: DbErr) -> RepositoryError {
    let message = err.to_string();
    if message.contains(CATEGORY_CONSTRAINT) {
        RepositoryError::CategoryRejected(message)
    } else {
        RepositoryError::Other(message)
    }
}

/// Convert database model to domain model.
fn to_domain(model: media::Model) -> MediaRecord {
    MediaRecord {
        id: model.id,
        filename: model.filename,
        url: model.url,
        path: model.path,
        size: model.size,
        category: model.media_type,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
