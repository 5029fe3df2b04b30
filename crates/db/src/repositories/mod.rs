//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod media;
pub mod site_config;

pub use media::MediaRepository;
pub use site_config::SiteConfigRepository;
