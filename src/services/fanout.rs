use sea_orm::ConnectionTrait;
use tracing::info;

use crate::{
    db::dao::DaoContext,
    error::AppError,
    services::membership::MembershipGuard,
};

/// Keeps one status row per (todo, member) pair of a list.
///
/// Both directions insert with `ON CONFLICT DO NOTHING`, so running either
/// twice for the same pair neither duplicates a row nor fails. Callers run
/// these on an open transaction so the whole fan-out commits or rolls back
/// as one unit.
pub struct FanOut<'c, C> {
    daos: DaoContext<'c, C>,
}

impl<'c, C: ConnectionTrait> FanOut<'c, C> {
    pub fn new(daos: DaoContext<'c, C>) -> Self {
        Self { daos }
    }

    /// Gives `user_id` an unchecked row for every todo already in the list.
    /// Returns how many rows were created.
    pub async fn on_user_joined(&self, list_id: &str, user_id: &str) -> Result<u64, AppError> {
        MembershipGuard::new(self.daos)
            .user_belongs_to_list(list_id, user_id)
            .await?;

        let todos = self.daos.todo().list_todos(list_id).await?;
        let statuses = self.daos.status();
        let mut created = 0;
        for todo in &todos {
            if statuses.insert_unchecked(todo.id, user_id).await? {
                created += 1;
            }
        }

        info!(list_id, user_id, todos = todos.len(), created, "fanned out joined user");
        Ok(created)
    }

    /// Gives every current member an unchecked row for `todo_id`.
    /// Returns how many rows were created.
    pub async fn on_todo_created(&self, list_id: &str, todo_id: i32) -> Result<u64, AppError> {
        let todo = self.daos.todo().require_todo(todo_id).await?;
        if todo.list_id != list_id {
            return Err(AppError::forbidden("Todo does not belong to this list"));
        }

        let members = self.daos.user().list_members(list_id).await?;
        let statuses = self.daos.status();
        let mut created = 0;
        for member in &members {
            if statuses.insert_unchecked(todo_id, &member.id).await? {
                created += 1;
            }
        }

        info!(list_id, todo_id, members = members.len(), created, "fanned out created todo");
        Ok(created)
    }
}
