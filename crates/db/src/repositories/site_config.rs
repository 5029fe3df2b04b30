//! Site settings repository.
//!
//! Writes fire the table trigger, which notifies listeners on the
//! `site_config_changes` channel.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use tracing::info;

use crate::entities::site_config;
use quill_core::site_config::{ConfigMap, ConfigSource, SiteConfigError};

/// Site settings repository implementation.
#[derive(Debug, Clone)]
pub struct SiteConfigRepository {
    db: DatabaseConnection,
}

impl SiteConfigRepository {
    /// Create a new site config repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert or replace one key.
    ///
    /// # Errors
    ///
    /// Returns `SiteConfigError::Source` if the write fails.
    pub async fn upsert(&self, key: &str, value: &str) -> Result<(), SiteConfigError> {
        let active_model = site_config::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(Utc::now().into()),
        };

        site_config::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(site_config::Column::Key)
                    .update_columns([site_config::Column::Value, site_config::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(source_error)?;

        info!(%key, "Site config key saved");
        Ok(())
    }

    /// Remove one key. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `SiteConfigError::Source` if the delete fails.
    pub async fn remove(&self, key: &str) -> Result<bool, SiteConfigError> {
        let result = site_config::Entity::delete_by_id(key.to_string())
            .exec(&self.db)
            .await
            .map_err(source_error)?;

        if result.rows_affected > 0 {
            info!(%key, "Site config key removed");
        }
        Ok(result.rows_affected > 0)
    }
}

impl ConfigSource for SiteConfigRepository {
    async fn fetch_all(&self) -> Result<ConfigMap, SiteConfigError> {
        let models = site_config::Entity::find()
            .order_by_asc(site_config::Column::Key)
            .all(&self.db)
            .await
            .map_err(source_error)?;

        Ok(models.into_iter().map(|m| (m.key, m.value)).collect())
    }
}

#[allow(clippy::needless_pass_by_value)]
fn source_error(err: DbErr) -> SiteConfigError {
    SiteConfigError::Source(err.to_string())
}
