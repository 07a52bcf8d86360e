use std::sync::Arc;

use axum::Router;

use crate::{
    config::{AppConfig, DatabaseConfig},
    db::connection,
    routes::app,
    services::{ListService, ServiceContext},
    state::AppState,
};

/// Fresh in-memory SQLite database with the schema synced.
pub async fn test_state() -> Arc<AppState> {
    let mut cfg = AppConfig::default();
    cfg.database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_idle: 1,
    };
    let db = connection::connect(&cfg.database)
        .await
        .expect("connect to in-memory sqlite");
    AppState::new(cfg, db)
}

pub async fn test_service() -> ListService {
    let state = test_state().await;
    ServiceContext::from_state(state.as_ref()).lists()
}

pub async fn test_app() -> (Router, Arc<AppState>) {
    let state = test_state().await;
    (app(Arc::clone(&state)), state)
}
