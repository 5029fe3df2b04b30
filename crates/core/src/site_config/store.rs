//! In-memory site configuration with cache hydration and push updates.

use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tracing::{debug, info, instrument, warn};

use super::cache::ConfigCache;
use super::error::SiteConfigError;
use super::source::{ConfigEventSource, ConfigSource};
use super::types::{ConfigEvent, ConfigMap};

/// Shared site configuration.
///
/// Owned by the application state and passed where needed. Every change bumps
/// a version number observable through [`SiteConfigStore::subscribe`].
#[derive(Debug)]
pub struct SiteConfigStore<C: ConfigCache, S: ConfigSource> {
    cache: C,
    source: S,
    entries: RwLock<ConfigMap>,
    version: watch::Sender<u64>,
    /// Held across snapshot and save so cache writes land in change order.
    persisting: Mutex<()>,
}

impl<C: ConfigCache, S: ConfigSource> SiteConfigStore<C, S> {
    /// Create an empty store.
    #[must_use]
    pub fn new(cache: C, source: S) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            cache,
            source,
            entries: RwLock::new(ConfigMap::new()),
            version,
            persisting: Mutex::new(()),
        }
    }

    /// The authoritative source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the persisted cache. A missing or unreadable cache leaves the
    /// store empty.
    ///
    /// Returns the number of keys loaded.
    pub async fn hydrate(&self) -> usize {
        let map = match self.cache.load().await {
            Ok(Some(map)) => map,
            Ok(None) => {
                debug!("No site config cache yet");
                return 0;
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable site config cache");
                return 0;
            }
        };
        let count = map.len();
        *self.entries.write().await = map;
        self.bump();
        info!(keys = count, "Site config hydrated from cache");
        count
    }

    /// Replace the map with the source's current contents and persist it.
    ///
    /// # Errors
    ///
    /// Returns the source's error; the current map is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, SiteConfigError> {
        let fresh = self.source.fetch_all().await?;
        let count = fresh.len();
        let changed = {
            let mut entries = self.entries.write().await;
            let changed = *entries != fresh;
            *entries = fresh;
            changed
        };
        if changed {
            self.bump();
        }
        self.persist().await;
        info!(keys = count, changed, "Site config refreshed");
        Ok(count)
    }

    /// Apply one change event. Replaying an event is a no-op.
    ///
    /// Returns whether the map changed.
    pub async fn apply(&self, event: ConfigEvent) -> bool {
        let changed = {
            let mut entries = self.entries.write().await;
            match event {
                ConfigEvent::Upsert { key, value } => {
                    if entries.get(&key) == Some(&value) {
                        false
                    } else {
                        entries.insert(key, value);
                        true
                    }
                }
                ConfigEvent::Delete { key } => entries.remove(&key).is_some(),
            }
        };
        if changed {
            self.bump();
            self.persist().await;
        }
        changed
    }

    /// Apply events until the channel closes.
    pub async fn run(&self, mut events: mpsc::Receiver<ConfigEvent>) {
        while let Some(event) = events.recv().await {
            let key = event.key().to_string();
            let changed = self.apply(event).await;
            debug!(%key, changed, "Site config event applied");
        }
        info!("Site config event stream closed");
    }

    /// Hydrate, start listening, refetch, then follow events until the
    /// stream ends.
    ///
    /// Listening starts before the refetch so no change falls between them.
    ///
    /// # Errors
    ///
    /// Returns an error if the event source or the refetch fails.
    pub async fn sync<E: ConfigEventSource>(&self, events: &E) -> Result<(), SiteConfigError> {
        self.hydrate().await;
        let rx = events.subscribe().await?;
        self.refresh().await?;
        self.run(rx).await;
        Ok(())
    }

    /// Value of one key.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Copy of the whole map.
    pub async fn snapshot(&self) -> ConfigMap {
        self.entries.read().await.clone()
    }

    /// Current version; increases on every change.
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Watch the version for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    async fn persist(&self) {
        let _guard = self.persisting.lock().await;
        let snapshot = self.snapshot().await;
        if let Err(e) = self.cache.save(&snapshot).await {
            warn!(error = %e, "Failed to persist site config cache");
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
