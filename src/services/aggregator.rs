use chrono::Utc;
use sea_orm::ConnectionTrait;
use tracing::info;

use crate::{
    db::{dao::DaoContext, entities::todo},
    error::AppError,
    services::membership::MembershipGuard,
};

/// Outcome of one status flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub checked: bool,
    pub todo_completed: bool,
}

/// A todo is complete when every current member has checked it. An empty
/// list has no evidence of completion.
pub fn is_complete(checked: u64, members: u64) -> bool {
    members > 0 && checked == members
}

/// Owns the per-user check flag and the todo-level completion derived from
/// it. Counting and writing happen on the caller's connection, which must be
/// a transaction for the counts to describe one point in time.
pub struct StatusAggregator<'c, C> {
    daos: DaoContext<'c, C>,
}

impl<'c, C: ConnectionTrait> StatusAggregator<'c, C> {
    pub fn new(daos: DaoContext<'c, C>) -> Self {
        Self { daos }
    }

    pub async fn set_status(
        &self,
        todo_id: i32,
        user_id: &str,
        checked: bool,
    ) -> Result<StatusChange, AppError> {
        let (todo, _) = MembershipGuard::new(self.daos)
            .user_belongs_to_todos_list(todo_id, user_id)
            .await?;

        let checked_at = checked.then(|| Utc::now().fixed_offset());
        let status = self
            .daos
            .status()
            .upsert(todo_id, user_id, checked, checked_at)
            .await?;

        let todo_completed = self.recompute(&todo).await?;
        info!(
            todo_id,
            user_id,
            checked = status.is_checked,
            todo_completed,
            "status updated"
        );
        Ok(StatusChange {
            checked: status.is_checked,
            todo_completed,
        })
    }

    /// Re-derives `is_completed` from the status rows and the member count,
    /// writing it back only when it changed.
    pub async fn recompute(&self, todo: &todo::Model) -> Result<bool, AppError> {
        let checked = self.daos.status().count_checked(todo.id).await?;
        let members = self.daos.user().count_members(&todo.list_id).await?;
        let completed = is_complete(checked, members);

        if completed != todo.is_completed {
            self.daos.todo().set_completed(todo.id, completed).await?;
        }
        Ok(completed)
    }

    /// Runs [`Self::recompute`] for every todo in the list; used after the
    /// member count changes. Returns how many todos flipped.
    pub async fn recompute_list(&self, list_id: &str) -> Result<usize, AppError> {
        let mut flipped = 0;
        for todo in self.daos.todo().list_todos(list_id).await? {
            if self.recompute(&todo).await? != todo.is_completed {
                flipped += 1;
            }
        }
        Ok(flipped)
    }
}
