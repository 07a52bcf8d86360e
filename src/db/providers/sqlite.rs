use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use tracing::{debug, info};

use super::{
    pool_options,
    registry::{DbProvider, DbProviderId},
};
use crate::config::DatabaseConfig;

const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite runs on a single pooled connection: one writer at a time keeps
/// concurrent transactions from failing with `SQLITE_BUSY`, and an
/// in-memory database only exists on the connection that created it.
pub struct SqliteDbProvider;

#[async_trait]
impl DbProvider for SqliteDbProvider {
    fn id(&self) -> DbProviderId {
        DbProviderId::Sqlite
    }

    fn supports_url(&self, url: &str) -> bool {
        url.trim().to_ascii_lowercase().starts_with("sqlite:")
    }

    async fn connect(&self, cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
        let url = prepare_url(cfg.url.trim())?;
        if cfg.max_connections > 1 {
            info!(
                configured = cfg.max_connections,
                "sqlite pool limited to a single connection"
            );
        }

        let db = Database::connect(pool_options(url, 1, 1)).await?;
        Ok(db)
    }

    async fn post_connect(&self, db: &DatabaseConnection, _cfg: &DatabaseConfig) -> Result<()> {
        db.execute_unprepared("PRAGMA foreign_keys = ON").await?;
        db.execute_unprepared(&format!("PRAGMA busy_timeout = {SQLITE_BUSY_TIMEOUT_MS}"))
            .await?;
        Ok(())
    }
}

/// Creates the database file's parent directory and asks SQLite to create
/// the file itself (`mode=rwc`). In-memory URLs pass through untouched.
fn prepare_url(url: &str) -> Result<String> {
    if url.contains(":memory:") || url.contains("mode=memory") {
        return Ok(url.to_string());
    }

    let Some(path) = file_path(url) else {
        return Ok(url.to_string());
    };
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create sqlite directory {}", parent.display()))?;
        debug!(dir = %parent.display(), "ensured sqlite directory");
    }

    if url.contains("mode=") {
        return Ok(url.to_string());
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{url}{separator}mode=rwc"))
}

fn file_path(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty()).then_some(path)
}
