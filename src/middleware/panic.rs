use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{error::AppError, response::JsonApiResponse};

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Turns a panicking handler into a 500 envelope. Debug builds include the
/// panic message in the response; the panic hook does the logging.
pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(panic_to_json as PanicHandler)
}

fn panic_to_json(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if cfg!(debug_assertions) {
        format!("internal server error: {}", panic_message(panic.as_ref()))
    } else {
        "internal server error".to_string()
    };

    let mut response = JsonApiResponse::from_error(&AppError::internal(message)).into_response();
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic"
    }
}
