use sea_orm::ConnectionTrait;
use tracing::warn;

use crate::{
    db::{
        dao::DaoContext,
        entities::{list, todo, user},
    },
    error::AppError,
};

/// Decides whether a user may act inside a list.
///
/// Absent lists and todos are `NotFound`. A user id that does not resolve
/// inside the list is `Forbidden` whether or not it exists elsewhere, so the
/// answer never reveals other lists' members.
pub struct MembershipGuard<'c, C> {
    daos: DaoContext<'c, C>,
}

impl<'c, C: ConnectionTrait> MembershipGuard<'c, C> {
    pub fn new(daos: DaoContext<'c, C>) -> Self {
        Self { daos }
    }

    pub async fn is_member(&self, list_id: &str, user_id: &str) -> Result<bool, AppError> {
        Ok(self.daos.user().find_member(list_id, user_id).await?.is_some())
    }

    /// Resolves the list, then the user inside it.
    pub async fn user_belongs_to_list(
        &self,
        list_id: &str,
        user_id: &str,
    ) -> Result<(list::Model, user::Model), AppError> {
        let list = self.daos.list().require_list(list_id).await?;
        let member = self
            .daos
            .user()
            .find_member(list_id, user_id)
            .await?
            .ok_or_else(|| {
                warn!(list_id, user_id, "rejected non-member of list");
                AppError::forbidden("User is not a member of this list")
            })?;
        Ok((list, member))
    }

    /// Resolves the todo, then checks the user against the todo's list.
    pub async fn user_belongs_to_todos_list(
        &self,
        todo_id: i32,
        user_id: &str,
    ) -> Result<(todo::Model, user::Model), AppError> {
        let todo = self.daos.todo().require_todo(todo_id).await?;
        let member = self
            .daos
            .user()
            .find_member(&todo.list_id, user_id)
            .await?
            .ok_or_else(|| {
                warn!(todo_id, user_id, list_id = %todo.list_id, "rejected non-member of todo's list");
                AppError::forbidden("User is not a member of this todo's list")
            })?;
        Ok((todo, member))
    }
}
