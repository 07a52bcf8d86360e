use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, services::ListLocks};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub locks: ListLocks,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            locks: ListLocks::new(),
        })
    }
}
