//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for media and site settings
//! - Authentication middleware
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use quill_core::gate::AuthGate;
use quill_core::media::{MediaRepository as MediaRepoTrait, MediaService};
use quill_core::site_config::{FileConfigCache, SiteConfigStore};
use quill_core::storage::StorageBackend;
use quill_db::{MediaRepository, SiteConfigRepository};
use quill_shared::JwtService;

/// Media service on the configured backend, recording into `R`.
pub type Media<R = MediaRepository> = MediaService<StorageBackend, R>;

/// Site settings store backed by the database and a local cache file.
pub type SiteConfig = SiteConfigStore<FileConfigCache, SiteConfigRepository>;

/// Application state shared across handlers.
///
/// Generic over the media record repository; the server uses the database one.
pub struct AppState<R: MediaRepoTrait = MediaRepository> {
    /// Bearer-token gate for protected routes.
    pub gate: Arc<AuthGate<JwtService>>,
    /// Media upload, delete and browse.
    pub media: Arc<Media<R>>,
    /// Live site settings.
    pub site_config: Arc<SiteConfig>,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

impl<R: MediaRepoTrait> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            media: Arc::clone(&self.media),
            site_config: Arc::clone(&self.site_config),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// Creates the main application router.
pub fn create_router<R: MediaRepoTrait + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
