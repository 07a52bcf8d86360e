mod postgres;
mod registry;
mod sqlite;

use std::{sync::Arc, time::Duration};

use sea_orm::ConnectOptions;

pub use registry::{DbProvider, DbProviderId, DbProviders};

use self::{postgres::PostgresDbProvider, sqlite::SqliteDbProvider};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

pub fn default_registry() -> anyhow::Result<DbProviders> {
    DbProviders::new()
        .with_provider(Arc::new(PostgresDbProvider))?
        .with_provider(Arc::new(SqliteDbProvider))
}

/// Pool settings shared by every backend. Requests queue on `acquire` while
/// all connections are inside transactions.
fn pool_options(url: String, max_connections: u32, min_connections: u32) -> ConnectOptions {
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(CONNECT_TIMEOUT)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .sqlx_logging(false);
    options
}
