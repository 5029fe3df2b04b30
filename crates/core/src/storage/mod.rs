//! Object storage for published media.
//!
//! Objects live in a version-controlled file host (GitHub contents API), where
//! every write and delete is a commit, and are served through a CDN mirror.
//! OpenDAL backs local development and tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        ObjectStore trait                         │
//! │   stat(path)  ->  Option<ObjectVersion>                          │
//! │   put(path, bytes, message)  ->  StoredObject                    │
//! │   delete(path, message)  ->  DeleteOutcome                       │
//! ├──────────────────────────────┬───────────────────────────────────┤
//! │ GitHubContentStore (reqwest) │ OpendalStore (fs / memory)        │
//! └──────────────────────────────┴───────────────────────────────────┘
//!                 path ──► CdnResolver ──► https://{origin}/{owner}/{repo}/{branch}/{path}
//! ```

mod cdn;
mod config;
mod error;
mod github;
mod local;
mod service;

pub use cdn::CdnResolver;
pub use config::StorageConfig;
pub use error::StorageError;
pub use github::GitHubContentStore;
pub use local::OpendalStore;
pub use service::{DeleteOutcome, ObjectStore, ObjectVersion, StorageBackend, StoredObject};
