use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    prelude::DateTimeWithTimeZone, sea_query::OnConflict,
};

use super::{DaoLayerError, DaoResult};
use crate::db::entities::todo_user_status::{self, Entity as TodoUserStatus};

/// Join-table access. Rows are keyed `(todo_id, user_id)`; every write goes
/// through `ON CONFLICT` so duplicate creation never surfaces as an error.
pub struct StatusDao<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> StatusDao<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> StatusDao<'_, C> {
    /// Inserts an unchecked row unless the pair already has one.
    /// Returns whether a row was created.
    pub async fn insert_unchecked(&self, todo_id: i32, user_id: &str) -> DaoResult<bool> {
        let model = todo_user_status::ActiveModel {
            todo_id: Set(todo_id),
            user_id: Set(user_id.to_string()),
            is_checked: Set(false),
            checked_at: Set(None),
            ..Default::default()
        };
        let inserted = TodoUserStatus::insert(model)
            .on_conflict(Self::pair_conflict().do_nothing().to_owned())
            .exec_without_returning(self.conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(inserted > 0)
    }

    /// Writes the checked flag for a pair. `checked_at` must be `Some` exactly
    /// when `is_checked` is true; the caller owns that pairing.
    pub async fn upsert(
        &self,
        todo_id: i32,
        user_id: &str,
        is_checked: bool,
        checked_at: Option<DateTimeWithTimeZone>,
    ) -> DaoResult<todo_user_status::Model> {
        let model = todo_user_status::ActiveModel {
            todo_id: Set(todo_id),
            user_id: Set(user_id.to_string()),
            is_checked: Set(is_checked),
            checked_at: Set(checked_at),
            ..Default::default()
        };
        TodoUserStatus::insert(model)
            .on_conflict(
                Self::pair_conflict()
                    .update_columns([
                        todo_user_status::Column::IsChecked,
                        todo_user_status::Column::CheckedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await
            .map_err(DaoLayerError::Db)?;

        self.find(todo_id, user_id)
            .await?
            .ok_or_else(|| DaoLayerError::NotFound {
                entity: "TodoUserStatus",
                id: format!("{todo_id}/{user_id}"),
            })
    }

    pub async fn find(
        &self,
        todo_id: i32,
        user_id: &str,
    ) -> DaoResult<Option<todo_user_status::Model>> {
        TodoUserStatus::find_by_id((todo_id, user_id.to_string()))
            .one(self.conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn count_checked(&self, todo_id: i32) -> DaoResult<u64> {
        TodoUserStatus::find()
            .filter(todo_user_status::Column::TodoId.eq(todo_id))
            .filter(todo_user_status::Column::IsChecked.eq(true))
            .count(self.conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn list_for_todos(&self, todo_ids: &[i32]) -> DaoResult<Vec<todo_user_status::Model>> {
        if todo_ids.is_empty() {
            return Ok(Vec::new());
        }
        TodoUserStatus::find()
            .filter(todo_user_status::Column::TodoId.is_in(todo_ids.iter().copied()))
            .order_by_asc(todo_user_status::Column::TodoId)
            .order_by_asc(todo_user_status::Column::UserId)
            .all(self.conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn delete_for_todos(&self, todo_ids: &[i32]) -> DaoResult<u64> {
        if todo_ids.is_empty() {
            return Ok(0);
        }
        let result = TodoUserStatus::delete_many()
            .filter(todo_user_status::Column::TodoId.is_in(todo_ids.iter().copied()))
            .exec(self.conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }

    fn pair_conflict() -> OnConflict {
        OnConflict::columns([
            todo_user_status::Column::TodoId,
            todo_user_status::Column::UserId,
        ])
    }
}
