use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{health, lists, todos};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(lists::router(state.clone()))
        .merge(todos::router(state))
}
