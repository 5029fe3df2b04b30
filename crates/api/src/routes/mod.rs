//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};
use quill_core::media::MediaRepository;

pub mod health;
pub mod media;
pub mod site_config;

/// Creates the API router; mutating and media library routes sit behind the
/// auth gate.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state<R: MediaRepository + 'static>(state: AppState<R>) -> Router<AppState<R>> {
    let protected_routes = Router::new()
        .merge(media::routes::<R>(state.max_upload_bytes))
        .merge(site_config::protected_routes::<R>())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<R>,
        ));

    Router::new()
        .merge(health::routes::<R>())
        .merge(site_config::public_routes::<R>())
        .merge(protected_routes)
}
