//! Where site configuration comes from.

use std::future::Future;

use tokio::sync::mpsc;

use super::error::SiteConfigError;
use super::types::{ConfigEvent, ConfigMap};

/// Authoritative copy of the configuration, implemented by the db crate.
pub trait ConfigSource: Send + Sync {
    /// Fetch every key.
    fn fetch_all(&self) -> impl Future<Output = Result<ConfigMap, SiteConfigError>> + Send;
}

/// Push channel of configuration changes.
pub trait ConfigEventSource: Send + Sync {
    /// Start listening; events arrive on the returned channel until the
    /// source goes away.
    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<ConfigEvent>, SiteConfigError>> + Send;
}
