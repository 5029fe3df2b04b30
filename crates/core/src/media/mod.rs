//! Media pipeline.
//!
//! Uploads are validated, committed to the object store, then recorded in the
//! repository. A failed record insert undoes the object write. Deletes remove
//! objects best-effort and then the records in one batch.

mod delete;
mod error;
mod path;
mod repository;
mod saga;
mod service;
mod types;
mod upload;

#[cfg(test)]
mod tests;

pub use delete::DeleteOrchestrator;
pub use error::{ErrorKind, MediaError};
pub use path::{PathParams, derive_path, file_extension};
pub use repository::{MediaRepository, RepositoryError};
pub use saga::{Compensation, CompensationFailure, Saga};
pub use service::MediaService;
pub use types::{
    DeleteReport, LEGACY_POST_CATEGORY, MediaRecord, MediaType, NewMediaRecord, ObjectFailure,
    UploadInput, UploadResult,
};
pub use upload::{Clock, FixedClock, SystemClock, UploadOrchestrator};
