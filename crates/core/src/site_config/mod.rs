//! Site configuration synchronization.
//!
//! The [`SiteConfigStore`] holds the key/value site settings in memory. It is
//! hydrated from a persisted cache at startup, replaced by an authoritative
//! fetch, and kept current by change events pushed from the database.

mod cache;
mod error;
mod source;
mod store;
mod types;

pub use cache::{ConfigCache, FileConfigCache};
pub use error::SiteConfigError;
pub use source::{ConfigEventSource, ConfigSource};
pub use store::SiteConfigStore;
pub use types::{ConfigEvent, ConfigMap};
