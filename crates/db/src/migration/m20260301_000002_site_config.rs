//! Site settings table with change notifications.
//!
//! Every insert, update or delete publishes a JSON payload on the
//! `site_config_changes` channel, shaped like `ConfigEvent`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SITE_CONFIG_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS site_config CASCADE;
             DROP FUNCTION IF EXISTS notify_site_config_change();",
        )
        .await?;
        Ok(())
    }
}

const SITE_CONFIG_SQL: &str = r"
CREATE TABLE site_config (
    key VARCHAR(128) PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT site_config_key_check CHECK (length(trim(key)) > 0)
);

CREATE OR REPLACE FUNCTION notify_site_config_change() RETURNS trigger AS $$
BEGIN
    IF TG_OP = 'DELETE' THEN
        PERFORM pg_notify(
            'site_config_changes',
            json_build_object('op', 'delete', 'key', OLD.key)::text
        );
        RETURN OLD;
    END IF;

    PERFORM pg_notify(
        'site_config_changes',
        json_build_object('op', 'upsert', 'key', NEW.key, 'value', NEW.value)::text
    );
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_site_config_notify
    AFTER INSERT OR UPDATE OR DELETE ON site_config
    FOR EACH ROW EXECUTE FUNCTION notify_site_config_change();
";
