//! Request bodies, response bodies and the field checks the HTTP layer owns.

use axum::{Json, extract::rejection::JsonRejection};
use chrono::NaiveDate;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        dao::NewTodo,
        entities::{Priority, list, todo_user_status, user},
    },
    error::AppError,
    services::{ListSnapshot, TodoWithStatuses},
};

pub const MAX_MEMO_CHARS: usize = 5000;
pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, Deserialize)]
pub struct UpdateMemoRequest {
    pub memo: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub checked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListResponse {
    pub list_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteUserResponse {
    pub user_id: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct MemoResponse {
    pub memo: String,
}

#[derive(Debug, Serialize)]
pub struct NameResponse {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CheckedResponse {
    pub checked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub list_id: String,
    pub display_name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub todo_id: i32,
    pub user_id: String,
    pub is_checked: bool,
    pub checked_at: Option<DateTimeWithTimeZone>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: i32,
    pub list_id: String,
    pub title: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub user_statuses: Vec<StatusResponse>,
}

#[derive(Debug, Serialize)]
pub struct ListDataResponse {
    pub users: Vec<UserResponse>,
    pub todos: Vec<TodoResponse>,
    pub memo: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            list_id: model.list_id,
            display_name: model.display_name,
            created_at: model.created_at,
        }
    }
}

impl From<todo_user_status::Model> for StatusResponse {
    fn from(model: todo_user_status::Model) -> Self {
        Self {
            todo_id: model.todo_id,
            user_id: model.user_id,
            is_checked: model.is_checked,
            checked_at: model.checked_at,
        }
    }
}

impl From<TodoWithStatuses> for TodoResponse {
    fn from(value: TodoWithStatuses) -> Self {
        let TodoWithStatuses { todo, statuses } = value;
        Self {
            id: todo.id,
            list_id: todo.list_id,
            title: todo.title,
            priority: todo.priority,
            due_date: todo.due_date,
            is_completed: todo.is_completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
            user_statuses: statuses.into_iter().map(StatusResponse::from).collect(),
        }
    }
}

impl From<ListSnapshot> for ListDataResponse {
    fn from(snapshot: ListSnapshot) -> Self {
        let ListSnapshot { list, users, todos } = snapshot;
        let list::Model { memo, .. } = list;
        Self {
            users: users.into_iter().map(UserResponse::from).collect(),
            todos: todos.into_iter().map(TodoResponse::from).collect(),
            memo,
        }
    }
}

/// Unwraps a JSON body, reporting malformed input as a 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        AppError::bad_request(format!("Invalid request format: {}", rejection.body_text()))
    })
}

pub fn validate_memo(memo: &str) -> Result<(), AppError> {
    if memo.chars().count() > MAX_MEMO_CHARS {
        return Err(AppError::bad_request(format!(
            "Memo must be {MAX_MEMO_CHARS} characters or less"
        )));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::bad_request(format!(
            "Display name must be {MAX_NAME_CHARS} characters or less"
        )));
    }
    Ok(())
}

pub fn parse_todo_id(raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("Invalid todo ID format"))
}

impl CreateTodoRequest {
    /// Trims the title and fills in defaults: blank priority means medium,
    /// blank due date means none.
    pub fn into_new_todo(self) -> Result<NewTodo, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::bad_request("Title required"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::bad_request(format!(
                "Title must be {MAX_TITLE_CHARS} characters or less"
            )));
        }

        let mut new_todo = NewTodo::new(title);

        if let Some(priority) = non_blank(self.priority.as_deref()) {
            let priority = priority.parse::<Priority>().map_err(|_| {
                AppError::bad_request("Priority must be 'high', 'medium', or 'low'")
            })?;
            new_todo = new_todo.with_priority(priority);
        }

        if let Some(due_date) = non_blank(self.due_date.as_deref()) {
            let due_date = NaiveDate::parse_from_str(due_date, "%Y-%m-%d")
                .map_err(|_| AppError::bad_request("Invalid date format. Use YYYY-MM-DD"))?;
            new_todo = new_todo.with_due_date(due_date);
        }

        Ok(new_todo)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{CreateTodoRequest, parse_todo_id, validate_memo, validate_name};
    use crate::db::entities::Priority;

    fn request(title: &str, priority: Option<&str>, due_date: Option<&str>) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            priority: priority.map(str::to_string),
            due_date: due_date.map(str::to_string),
        }
    }

    #[test]
    fn blank_priority_and_date_fall_back_to_defaults() {
        let new_todo = request("  Buy milk ", Some(""), Some(" "))
            .into_new_todo()
            .expect("request should validate");

        assert_eq!(new_todo.title, "Buy milk");
        assert_eq!(new_todo.priority, Priority::Medium);
        assert_eq!(new_todo.due_date, None);
    }

    #[test]
    fn parses_priority_and_due_date() {
        let new_todo = request("Pay rent", Some("high"), Some("2026-11-01"))
            .into_new_todo()
            .expect("request should validate");

        assert_eq!(new_todo.priority, Priority::High);
        assert_eq!(new_todo.due_date, NaiveDate::from_ymd_opt(2026, 11, 1));
    }

    #[test]
    fn rejects_bad_todo_fields() {
        let blank = request("   ", None, None).into_new_todo().expect_err("blank title");
        assert_eq!(blank.message(), "Title required");

        let long = request(&"x".repeat(256), None, None)
            .into_new_todo()
            .expect_err("title too long");
        assert_eq!(long.message(), "Title must be 255 characters or less");

        let priority = request("ok", Some("urgent"), None)
            .into_new_todo()
            .expect_err("unknown priority");
        assert_eq!(priority.message(), "Priority must be 'high', 'medium', or 'low'");

        let date = request("ok", None, Some("01/11/2026"))
            .into_new_todo()
            .expect_err("bad date");
        assert_eq!(date.message(), "Invalid date format. Use YYYY-MM-DD");
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        assert!(validate_name(&"é".repeat(100)).is_ok());
        assert!(validate_name(&"é".repeat(101)).is_err());
        assert!(validate_memo(&"a".repeat(5000)).is_ok());
        assert!(validate_memo(&"a".repeat(5001)).is_err());
    }

    #[test]
    fn todo_ids_must_be_positive_integers() {
        assert_eq!(parse_todo_id("12").expect("valid id"), 12);
        assert!(parse_todo_id("0").is_err());
        assert!(parse_todo_id("-3").is_err());
        assert!(parse_todo_id("abc").is_err());
    }
}
