//! Site settings routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::AuthUser};
use quill_core::media::MediaRepository;
use quill_core::site_config::{ConfigEvent, ConfigMap};
use quill_shared::AppError;

const MAX_KEY_LEN: usize = 128;

/// Public read routes.
pub fn public_routes<R: MediaRepository + 'static>() -> Router<AppState<R>> {
    Router::new().route("/site-config", get(get_site_config::<R>))
}

/// Authenticated write routes.
pub fn protected_routes<R: MediaRepository + 'static>() -> Router<AppState<R>> {
    Router::new().route(
        "/site-config/{key}",
        put(put_site_config::<R>).delete(delete_site_config::<R>),
    )
}

/// Request body for setting a key.
#[derive(Debug, Deserialize)]
pub struct SetValueRequest {
    /// New value.
    pub value: String,
}

/// GET `/site-config`
async fn get_site_config<R: MediaRepository + 'static>(
    State(state): State<AppState<R>>,
) -> Json<ConfigMap> {
    Json(state.site_config.snapshot().await)
}

/// PUT `/site-config/{key}`
async fn put_site_config<R: MediaRepository + 'static>(
    State(state): State<AppState<R>>,
    auth: AuthUser,
    Path(key): Path<String>,
    Json(body): Json<SetValueRequest>,
) -> ApiResult<StatusCode> {
    let key = validate_key(&key)?;
    state.site_config.source().upsert(key, &body.value).await?;
    state
        .site_config
        .apply(ConfigEvent::Upsert {
            key: key.to_string(),
            value: body.value,
        })
        .await;
    info!(user_id = %auth.user_id(), %key, "Site config updated");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE `/site-config/{key}`
async fn delete_site_config<R: MediaRepository + 'static>(
    State(state): State<AppState<R>>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let key = validate_key(&key)?;
    if !state.site_config.source().remove(key).await? {
        return Err(AppError::NotFound(format!("site config key {key}")).into());
    }
    state
        .site_config
        .apply(ConfigEvent::Delete {
            key: key.to_string(),
        })
        .await;
    info!(user_id = %auth.user_id(), %key, "Site config removed");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_key(key: &str) -> Result<&str, ApiError> {
    let key = key.trim();
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(AppError::Validation(format!(
            "config key must be 1-{MAX_KEY_LEN} characters"
        ))
        .into());
    }
    Ok(key)
}
