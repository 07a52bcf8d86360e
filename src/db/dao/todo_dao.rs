use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, Order, QueryFilter, Set};

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{
    Priority,
    todo::{self, Entity as Todo},
};

/// Field values for a todo, already validated by the caller.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: Priority::default(),
            due_date: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

pub struct TodoDao<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> TodoDao<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> DaoBase for TodoDao<'_, C> {
    type Entity = Todo;
    type Conn = C;
    type Id = i32;

    const ENTITY: &'static str = "Todo";

    fn conn(&self) -> &C {
        self.conn
    }
}

impl<C: ConnectionTrait> TodoDao<'_, C> {
    pub async fn create_todo(&self, list_id: &str, new_todo: NewTodo) -> DaoResult<todo::Model> {
        let model = todo::ActiveModel {
            list_id: Set(list_id.to_string()),
            title: Set(new_todo.title),
            priority: Set(new_todo.priority),
            due_date: Set(new_todo.due_date),
            is_completed: Set(false),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn require_todo(&self, id: i32) -> DaoResult<todo::Model> {
        self.find_by_id(id).await
    }

    pub async fn list_todos(&self, list_id: &str) -> DaoResult<Vec<todo::Model>> {
        let list_id = list_id.to_string();
        self.find_all(Some((todo::Column::Id, Order::Asc)), move |query| {
            query.filter(todo::Column::ListId.eq(list_id))
        })
        .await
    }

    pub async fn set_completed(&self, id: i32, is_completed: bool) -> DaoResult<todo::Model> {
        self.update(id, move |active| {
            active.is_completed = Set(is_completed);
        })
        .await
    }

    pub async fn delete_todos(&self, list_id: &str) -> DaoResult<u64> {
        let result = Todo::delete_many()
            .filter(todo::Column::ListId.eq(list_id))
            .exec(self.conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}
