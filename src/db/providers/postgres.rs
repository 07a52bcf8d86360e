use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use tracing::info;

use super::{
    pool_options,
    registry::{DbProvider, DbProviderId},
};
use crate::config::DatabaseConfig;

/// Pooled Postgres. Isolation is chosen per transaction by the service layer,
/// so the pool itself stays at the server default.
pub struct PostgresDbProvider;

#[async_trait]
impl DbProvider for PostgresDbProvider {
    fn id(&self) -> DbProviderId {
        DbProviderId::Postgres
    }

    fn supports_url(&self, url: &str) -> bool {
        let normalized = url.trim().to_ascii_lowercase();
        normalized.starts_with("postgres://") || normalized.starts_with("postgresql://")
    }

    async fn connect(&self, cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
        info!(
            max_connections = cfg.max_connections,
            min_idle = cfg.min_idle,
            "opening postgres pool"
        );
        let options = pool_options(cfg.url.trim().to_string(), cfg.max_connections, cfg.min_idle);
        Ok(Database::connect(options).await?)
    }
}
