//! Media library table.
//!
//! The `type` check constraint still enumerates the older category set, where
//! article images are stored as `blog`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(MEDIA_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS media CASCADE;")
            .await?;
        Ok(())
    }
}

const MEDIA_SQL: &str = r"
CREATE TABLE media (
    id UUID PRIMARY KEY,
    filename TEXT NOT NULL,
    url TEXT NOT NULL,
    path TEXT NOT NULL,
    size BIGINT NOT NULL,
    type VARCHAR(16) NOT NULL DEFAULT 'other',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT media_size_check CHECK (size >= 0),
    CONSTRAINT media_type_check CHECK (type IN ('avatar', 'blog', 'site', 'other'))
);

-- Media library listing, newest first
CREATE INDEX idx_media_created ON media(created_at DESC);

-- Listing filtered by category
CREATE INDEX idx_media_type_created ON media(type, created_at DESC);

-- Lookups by storage key (avatars are overwritten in place)
CREATE INDEX idx_media_path ON media(path);
";
