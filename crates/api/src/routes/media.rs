//! Media library routes.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    routing::get,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::AuthUser};
use quill_core::media::{
    DeleteReport, MediaRecord, MediaRepository, MediaType, UploadInput, UploadResult,
};
use quill_shared::AppError;
use quill_shared::types::{PageRequest, PageResponse};

/// Multipart framing allowance on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates the media routes.
pub fn routes<R: MediaRepository + 'static>(max_upload_bytes: usize) -> Router<AppState<R>> {
    Router::new()
        .route(
            "/media",
            get(list_media::<R>)
                .post(upload_media::<R>)
                .delete(delete_media::<R>),
        )
        .route("/media/{id}", get(get_media::<R>))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for a batch delete.
#[derive(Debug, Deserialize)]
pub struct DeleteMediaRequest {
    /// Record ids to delete.
    pub ids: Vec<Uuid>,
}

/// Query parameters for the media library listing.
#[derive(Debug, Deserialize)]
pub struct ListMediaQuery {
    /// Category filter.
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/media`
///
/// Multipart fields: `file` (required), `type`, `context_id`.
async fn upload_media<R: MediaRepository + 'static>(
    State(state): State<AppState<R>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResult>)> {
    let mut file: Option<(Bytes, String, String)> = None;
    let mut media_type = MediaType::Other;
    let mut context_id = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                file = Some((data, content_type, filename));
            }
            "type" => {
                media_type = MediaType::parse_or_other(&field.text().await.map_err(bad_multipart)?);
            }
            "context_id" => {
                let value = field.text().await.map_err(bad_multipart)?;
                context_id = Some(value).filter(|v| !v.trim().is_empty());
            }
            _ => {}
        }
    }

    let Some((data, content_type, filename)) = file else {
        return Err(AppError::Validation("multipart field `file` is required".into()).into());
    };

    let mut input = UploadInput::new(data, content_type, filename, media_type)
        .with_owner(auth.user_id().to_string());
    input.context_id = context_id;

    let result = state.media.upload(input).await?;
    info!(user_id = %auth.user_id(), id = %result.id, path = %result.path, "Media uploaded via API");

    Ok((StatusCode::CREATED, Json(result)))
}

/// DELETE `/media`
async fn delete_media<R: MediaRepository + 'static>(
    State(state): State<AppState<R>>,
    auth: AuthUser,
    Json(body): Json<DeleteMediaRequest>,
) -> ApiResult<Json<DeleteReport>> {
    let report = state.media.delete(&body.ids).await?;
    info!(
        user_id = %auth.user_id(),
        records = report.records_deleted,
        "Media deleted via API"
    );
    Ok(Json(report))
}

/// GET `/media`
async fn list_media<R: MediaRepository + 'static>(
    State(state): State<AppState<R>>,
    _auth: AuthUser,
    Query(query): Query<ListMediaQuery>,
) -> ApiResult<Json<PageResponse<MediaRecord>>> {
    let media_type = match query.media_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            MediaType::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown media type: {raw}")))?,
        ),
    };
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    Ok(Json(state.media.list(media_type, page).await?))
}

/// GET `/media/{id}`
async fn get_media<R: MediaRepository + 'static>(
    State(state): State<AppState<R>>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MediaRecord>> {
    Ok(Json(state.media.get(id).await?))
}

#[allow(clippy::needless_pass_by_value)]
fn bad_multipart(err: MultipartError) -> ApiError {
    AppError::Validation(err.body_text()).into()
}
