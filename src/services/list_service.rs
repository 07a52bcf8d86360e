use std::collections::HashMap;

use sea_orm::DatabaseConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    db::{
        dao::{DaoContext, NewTodo},
        entities::{list, todo, todo_user_status, user},
    },
    error::AppError,
    services::{
        aggregator::StatusAggregator,
        fanout::FanOut,
        list_locks::ListLocks,
        membership::MembershipGuard,
        transaction::{begin, finalize},
    },
};

#[derive(Debug, Clone)]
pub struct TodoWithStatuses {
    pub todo: todo::Model,
    pub statuses: Vec<todo_user_status::Model>,
}

#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub list: list::Model,
    pub users: Vec<user::Model>,
    pub todos: Vec<TodoWithStatuses>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub statuses: u64,
    pub todos: u64,
    pub users: u64,
}

/// Caller-facing list operations. Every mutation runs in one transaction;
/// mutations that touch membership or status rows also hold the list's lock
/// until the transaction ends.
#[derive(Clone)]
pub struct ListService {
    db: DatabaseConnection,
    locks: ListLocks,
}

impl ListService {
    pub fn new(db: DatabaseConnection, locks: ListLocks) -> Self {
        Self { db, locks }
    }

    /// Creates a list together with its founding member.
    pub async fn create_list(&self) -> Result<(list::Model, user::Model), AppError> {
        let list_id = Uuid::new_v4().to_string();
        let founder_id = Uuid::new_v4().to_string();

        let txn = begin(&self.db).await?;
        let result = async {
            let daos = DaoContext::new(&txn);
            let list = daos.list().create_list(&list_id).await?;
            let founder = daos.user().create_user(&list_id, &founder_id).await?;
            FanOut::new(daos).on_user_joined(&list_id, &founder_id).await?;
            Ok::<_, AppError>((list, founder))
        }
        .await;
        let created = finalize(txn, result).await?;

        info!(list_id = %created.0.id, founder_id = %created.1.id, "list created");
        Ok(created)
    }

    /// Adds a member and gives them a row for every existing todo. Todos that
    /// were complete stop being complete once the new member is counted.
    pub async fn invite_user(&self, list_id: &str) -> Result<user::Model, AppError> {
        let user_id = Uuid::new_v4().to_string();
        let _guard = self.locks.acquire(list_id).await?;

        let txn = begin(&self.db).await?;
        let result = async {
            let daos = DaoContext::new(&txn);
            daos.list().require_list(list_id).await?;
            let user = daos.user().create_user(list_id, &user_id).await?;
            FanOut::new(daos).on_user_joined(list_id, &user_id).await?;
            let flipped = StatusAggregator::new(daos).recompute_list(list_id).await?;
            Ok::<_, AppError>((user, flipped))
        }
        .await;
        let (user, flipped) = finalize(txn, result).await?;

        info!(list_id, user_id = %user.id, reopened_todos = flipped, "user invited");
        Ok(user)
    }

    pub async fn rename_user(
        &self,
        list_id: &str,
        user_id: &str,
        display_name: &str,
    ) -> Result<user::Model, AppError> {
        let txn = begin(&self.db).await?;
        let result = async {
            let daos = DaoContext::new(&txn);
            MembershipGuard::new(daos)
                .user_belongs_to_list(list_id, user_id)
                .await?;
            Ok::<_, AppError>(daos.user().rename(user_id, display_name).await?)
        }
        .await;
        finalize(txn, result).await
    }

    pub async fn update_memo(&self, list_id: &str, memo: &str) -> Result<list::Model, AppError> {
        let daos = DaoContext::new(&self.db);
        Ok(daos.list().update_memo(list_id, memo).await?)
    }

    /// Inserts a todo and gives every current member an unchecked row for it.
    pub async fn create_todo(
        &self,
        list_id: &str,
        new_todo: NewTodo,
    ) -> Result<TodoWithStatuses, AppError> {
        let _guard = self.locks.acquire(list_id).await?;

        let txn = begin(&self.db).await?;
        let result = async {
            let daos = DaoContext::new(&txn);
            daos.list().require_list(list_id).await?;
            let todo = daos.todo().create_todo(list_id, new_todo).await?;
            FanOut::new(daos).on_todo_created(list_id, todo.id).await?;
            let statuses = daos.status().list_for_todos(&[todo.id]).await?;
            Ok::<_, AppError>(TodoWithStatuses { todo, statuses })
        }
        .await;
        let created = finalize(txn, result).await?;

        info!(
            list_id,
            todo_id = created.todo.id,
            members = created.statuses.len(),
            "todo created"
        );
        Ok(created)
    }

    /// Flips one member's check on one todo and returns the stored value.
    pub async fn set_status(
        &self,
        todo_id: i32,
        user_id: &str,
        checked: bool,
    ) -> Result<bool, AppError> {
        // the list lock is keyed by the todo's list; a todo never moves
        let list_id = DaoContext::new(&self.db)
            .todo()
            .require_todo(todo_id)
            .await?
            .list_id;
        let _guard = self.locks.acquire(&list_id).await?;

        let txn = begin(&self.db).await?;
        let result = StatusAggregator::new(DaoContext::new(&txn))
            .set_status(todo_id, user_id, checked)
            .await;
        let change = finalize(txn, result).await?;
        Ok(change.checked)
    }

    /// Everything a member sees for a list, read from one transaction.
    pub async fn list_snapshot(
        &self,
        list_id: &str,
        user_id: &str,
    ) -> Result<ListSnapshot, AppError> {
        let txn = begin(&self.db).await?;
        let result = async {
            let daos = DaoContext::new(&txn);
            let (list, _) = MembershipGuard::new(daos)
                .user_belongs_to_list(list_id, user_id)
                .await?;
            let users = daos.user().list_members(list_id).await?;
            let todos = daos.todo().list_todos(list_id).await?;
            let todo_ids: Vec<i32> = todos.iter().map(|todo| todo.id).collect();
            let statuses = daos.status().list_for_todos(&todo_ids).await?;
            Ok::<_, AppError>((list, users, todos, statuses))
        }
        .await;
        let (list, users, todos, statuses) = finalize(txn, result).await?;

        debug!(list_id, users = users.len(), todos = todos.len(), "list snapshot read");
        let todos = group_statuses(&users, todos, statuses);
        Ok(ListSnapshot { list, users, todos })
    }

    /// Removes a list and everything under it. Ops tooling; no route calls
    /// this.
    pub async fn purge_list(&self, list_id: &str) -> Result<PurgeSummary, AppError> {
        let _guard = self.locks.acquire(list_id).await?;

        let txn = begin(&self.db).await?;
        let result = async {
            let daos = DaoContext::new(&txn);
            daos.list().require_list(list_id).await?;
            let todo_ids: Vec<i32> = daos
                .todo()
                .list_todos(list_id)
                .await?
                .iter()
                .map(|todo| todo.id)
                .collect();
            let summary = PurgeSummary {
                statuses: daos.status().delete_for_todos(&todo_ids).await?,
                todos: daos.todo().delete_todos(list_id).await?,
                users: daos.user().delete_members(list_id).await?,
            };
            daos.list().delete_list(list_id).await?;
            Ok::<_, AppError>(summary)
        }
        .await;
        let summary = finalize(txn, result).await?;

        info!(
            list_id,
            statuses = summary.statuses,
            todos = summary.todos,
            users = summary.users,
            "list purged"
        );
        Ok(summary)
    }
}

/// Attaches each todo's status rows, ordered like `users`.
fn group_statuses(
    users: &[user::Model],
    todos: Vec<todo::Model>,
    statuses: Vec<todo_user_status::Model>,
) -> Vec<TodoWithStatuses> {
    let rank: HashMap<&str, usize> = users
        .iter()
        .enumerate()
        .map(|(index, user)| (user.id.as_str(), index))
        .collect();

    let mut by_todo: HashMap<i32, Vec<todo_user_status::Model>> = HashMap::new();
    for status in statuses {
        by_todo.entry(status.todo_id).or_default().push(status);
    }

    todos
        .into_iter()
        .map(|todo| {
            let mut statuses = by_todo.remove(&todo.id).unwrap_or_default();
            statuses.sort_by_key(|status| {
                rank.get(status.user_id.as_str())
                    .copied()
                    .unwrap_or(usize::MAX)
            });
            TodoWithStatuses { todo, statuses }
        })
        .collect()
}
