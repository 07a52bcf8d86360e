use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::{
    config::defaults::DEFAULT_CORS_ORIGIN,
    middleware::{catch_panic_layer, json_error_middleware},
    state::AppState,
};

use super::api;

pub const API_PREFIX: &str = "/api";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().nest(API_PREFIX, api::router(state))
}

/// The full HTTP stack: routes, envelope rewriting, panic capture, CORS and
/// request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.http.cors_origin);
    Router::new()
        .merge(router(state))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(origin.trim()).unwrap_or_else(|_| {
        warn!(origin, "invalid CORS origin, using default");
        HeaderValue::from_static(DEFAULT_CORS_ORIGIN)
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}
