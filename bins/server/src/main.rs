//! Quill API Server
//!
//! Main entry point for the Quill media and site settings backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quill_api::{AppState, SiteConfig, create_router};
use quill_core::gate::AuthGate;
use quill_core::media::MediaService;
use quill_core::site_config::{FileConfigCache, SiteConfigStore};
use quill_core::storage::{CdnResolver, StorageBackend, StorageConfig};
use quill_db::{MediaRepository, PgConfigListener, SiteConfigRepository, connect_with};
use quill_shared::{AppConfig, JwtService};

const DEFAULT_LOG_FILTER: &str =
    "quill=debug,quill_api=debug,quill_core=debug,quill_db=debug,tower_http=debug";

/// Pause before re-subscribing after the change listener drops.
const RESYNC_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(config.server.json_logs);

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    // Object store and public URLs
    let storage_config = StorageConfig::from_settings(&config.storage);
    let store = StorageBackend::from_config(&storage_config)?;
    let cdn = CdnResolver::from_config(&config.cdn, &config.storage.provider)?;
    info!(
        provider = config.storage.provider.name(),
        "Object store configured"
    );

    let media = MediaService::new(
        Arc::new(store),
        Arc::new(MediaRepository::new(db.clone())),
        cdn,
        config.upload.clone(),
    );

    // Site settings: hydrate now so the first requests see cached values
    let site_config = Arc::new(SiteConfigStore::new(
        FileConfigCache::new(&config.site_config.cache_path),
        SiteConfigRepository::new(db.clone()),
    ));
    site_config.hydrate().await;
    let listener = PgConfigListener::from_connection(&db, &config.site_config.channel);
    tokio::spawn(sync_site_config(Arc::clone(&site_config), listener));

    // Create application state
    let state = AppState {
        gate: Arc::new(AuthGate::new(JwtService::new(config.jwt.clone()))),
        media: Arc::new(media),
        site_config,
        max_upload_bytes: usize::try_from(config.upload.max_file_size).unwrap_or(usize::MAX),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Follow database change events for the life of the process, resubscribing
/// (and refetching) whenever the listener drops.
async fn sync_site_config(store: Arc<SiteConfig>, listener: PgConfigListener) {
    loop {
        match store.sync(&listener).await {
            Ok(()) => warn!("Site config stream ended, resubscribing"),
            Err(e) => warn!(error = %e, "Site config sync failed, retrying"),
        }
        tokio::time::sleep(RESYNC_DELAY).await;
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
