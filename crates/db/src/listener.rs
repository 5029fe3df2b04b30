//! Postgres `LISTEN`/`NOTIFY` source of site config changes.

use sea_orm::DatabaseConnection;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use quill_core::site_config::{ConfigEvent, ConfigEventSource, SiteConfigError};

const DEFAULT_BUFFER: usize = 64;

/// Forwards notifications from a Postgres channel as [`ConfigEvent`]s.
///
/// Each subscription holds one dedicated connection. The stream ends when the
/// receiver is dropped or the connection cannot be re-established;
/// notifications sent while disconnected are lost, so callers refetch after
/// resubscribing.
#[derive(Debug, Clone)]
pub struct PgConfigListener {
    pool: PgPool,
    channel: String,
    buffer: usize,
}

impl PgConfigListener {
    /// Listen on `channel` using connections from `pool`.
    #[must_use]
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
            buffer: DEFAULT_BUFFER,
        }
    }

    /// Listen using the pool behind a `SeaORM` connection.
    #[must_use]
    pub fn from_connection(db: &DatabaseConnection, channel: impl Into<String>) -> Self {
        Self::new(db.get_postgres_connection_pool().clone(), channel)
    }
}

impl ConfigEventSource for PgConfigListener {
    async fn subscribe(&self) -> Result<mpsc::Receiver<ConfigEvent>, SiteConfigError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| SiteConfigError::Events(e.to_string()))?;
        listener
            .listen(&self.channel)
            .await
            .map_err(|e| SiteConfigError::Events(e.to_string()))?;
        info!(channel = %self.channel, "Listening for site config changes");

        let (tx, rx) = mpsc::channel(self.buffer);
        let channel = self.channel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tx.closed() => break,
                    next = listener.recv() => match next {
                        Ok(notification) => {
                            match serde_json::from_str::<ConfigEvent>(notification.payload()) {
                                Ok(event) => {
                                    debug!(key = %event.key(), "Site config notification");
                                    if tx.send(event).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => warn!(
                                    error = %e,
                                    payload = %notification.payload(),
                                    "Ignoring malformed site config notification"
                                ),
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Site config listener connection lost");
                            break;
                        }
                    },
                }
            }
            info!(%channel, "Site config listener stopped");
        });

        Ok(rx)
    }
}
