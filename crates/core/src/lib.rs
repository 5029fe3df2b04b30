//! Core logic for Quill.
//!
//! No web framework and no database driver live here; the db and api crates
//! plug into the traits defined below.
//!
//! # Modules
//!
//! - `media` - Upload and delete pipelines, storage keys, media records
//! - `storage` - Object store clients and CDN URLs
//! - `gate` - Bearer-token verification for mutating requests
//! - `site_config` - Site settings cache and change-event sync

pub mod gate;
pub mod media;
pub mod site_config;
pub mod storage;
