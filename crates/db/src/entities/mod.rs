//! `SeaORM` entities.

pub mod media;
pub mod site_config;
