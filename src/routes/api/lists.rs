use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post, put},
};

use crate::{
    response::{ApiResult, JsonApiResponse},
    services::{ListService, ServiceContext},
    state::AppState,
};

use super::payload::{
    CreateListResponse, CreateTodoRequest, InviteUserResponse, ListDataResponse, MemoResponse,
    NameResponse, TodoResponse, UpdateMemoRequest, UpdateNameRequest, json_body, validate_memo,
    validate_name,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lists", post(create_list))
        .route("/lists/{list_id}/users/{user_id}", get(get_list_data))
        .route("/lists/{list_id}/memo", put(update_memo))
        .route("/lists/{list_id}/users", post(invite_user))
        .route("/lists/{list_id}/users/{user_id}/name", put(update_user_name))
        .route("/lists/{list_id}/todos", post(create_todo))
        .with_state(state)
}

async fn create_list(State(state): State<Arc<AppState>>) -> ApiResult<CreateListResponse> {
    let (list, founder) = list_service(&state).create_list().await?;
    JsonApiResponse::created(CreateListResponse {
        list_id: list.id,
        user_id: founder.id,
    })
}

async fn get_list_data(
    State(state): State<Arc<AppState>>,
    Path((list_id, user_id)): Path<(String, String)>,
) -> ApiResult<ListDataResponse> {
    let snapshot = list_service(&state).list_snapshot(&list_id, &user_id).await?;
    JsonApiResponse::ok(snapshot.into())
}

async fn update_memo(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<String>,
    payload: Result<Json<UpdateMemoRequest>, JsonRejection>,
) -> ApiResult<MemoResponse> {
    let body = json_body(payload)?;
    validate_memo(&body.memo)?;
    let list = list_service(&state).update_memo(&list_id, &body.memo).await?;
    JsonApiResponse::ok(MemoResponse { memo: list.memo })
}

async fn invite_user(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<String>,
) -> ApiResult<InviteUserResponse> {
    let user = list_service(&state).invite_user(&list_id).await?;
    let url = format!("/{}/{}", user.list_id, user.id);
    JsonApiResponse::created(InviteUserResponse {
        user_id: user.id,
        url,
    })
}

async fn update_user_name(
    State(state): State<Arc<AppState>>,
    Path((list_id, user_id)): Path<(String, String)>,
    payload: Result<Json<UpdateNameRequest>, JsonRejection>,
) -> ApiResult<NameResponse> {
    let body = json_body(payload)?;
    validate_name(&body.name)?;
    let user = list_service(&state)
        .rename_user(&list_id, &user_id, &body.name)
        .await?;
    JsonApiResponse::ok(NameResponse {
        name: user.display_name,
    })
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<String>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> ApiResult<TodoResponse> {
    let new_todo = json_body(payload)?.into_new_todo()?;
    let created = list_service(&state).create_todo(&list_id, new_todo).await?;
    JsonApiResponse::created(created.into())
}

fn list_service(state: &AppState) -> ListService {
    ServiceContext::from_state(state).lists()
}
