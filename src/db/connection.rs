use anyhow::Context;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::{config::DatabaseConfig, db::providers::default_registry};

/// Opens the pool for `cfg.url`, applies backend session setup and syncs the
/// four tables from the entity registry.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let providers = default_registry()?;
    let provider = providers.provider_for_url(&cfg.url)?;
    info!(provider = provider.id().as_str(), "connecting to database");

    let db = provider
        .connect(cfg)
        .await
        .with_context(|| format!("failed to connect using {} provider", provider.id().as_str()))?;
    provider.post_connect(&db, cfg).await?;

    info!("syncing database schema from entities");
    db.get_schema_registry("shared_todo::db::entities::*")
        .sync(&db)
        .await
        .context("failed to sync database schema")?;
    Ok(db)
}
