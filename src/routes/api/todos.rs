use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::put,
};

use crate::{
    response::{ApiResult, JsonApiResponse},
    services::ServiceContext,
    state::AppState,
};

use super::payload::{CheckedResponse, UpdateStatusRequest, json_body, parse_todo_id};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/todos/{todo_id}/status/{user_id}", put(update_status))
        .with_state(state)
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path((todo_id, user_id)): Path<(String, String)>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<CheckedResponse> {
    let todo_id = parse_todo_id(&todo_id)?;
    let body = json_body(payload)?;
    let checked = ServiceContext::from_state(state.as_ref())
        .lists()
        .set_status(todo_id, &user_id, body.checked)
        .await?;
    JsonApiResponse::ok(CheckedResponse { checked })
}
