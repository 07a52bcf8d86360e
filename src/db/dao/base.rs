use std::fmt;

use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, EntityTrait, FromQueryResult,
    IntoActiveModel, Iterable, Order, PrimaryKeyToColumn, PrimaryKeyTrait, QueryOrder, Select,
};

use super::base_traits::{HasCreatedAtColumn, TimestampedActiveModel};
use super::error::{DaoLayerError, DaoResult};

type PrimaryKeyValue<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Shared create/read/update plumbing for timestamped entities.
///
/// Implementors borrow a connection instead of owning a pool, so the same DAO
/// runs against the pool for plain reads and against an open transaction for
/// multi-row writes.
#[async_trait::async_trait]
pub trait DaoBase: Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + TimestampedActiveModel
        + Send,
    Self::Entity: HasCreatedAtColumn,
{
    type Entity: EntityTrait + Send + Sync;
    type Conn: ConnectionTrait;
    type Id: Into<PrimaryKeyValue<Self::Entity>> + fmt::Display + Clone + Send + Sync;

    const ENTITY: &'static str;

    fn conn(&self) -> &Self::Conn;

    async fn create(
        &self,
        mut active: <Self::Entity as EntityTrait>::ActiveModel,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let now = Utc::now().fixed_offset();
        active.set_created_at(now);
        active.set_updated_at(now);
        active.insert(self.conn()).await.map_err(DaoLayerError::Db)
    }

    async fn find_optional(
        &self,
        id: Self::Id,
    ) -> DaoResult<Option<<Self::Entity as EntityTrait>::Model>> {
        Self::Entity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(DaoLayerError::Db)
    }

    async fn find_by_id(&self, id: Self::Id) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        self.find_optional(id.clone())
            .await?
            .ok_or_else(|| DaoLayerError::NotFound {
                entity: Self::ENTITY,
                id: id.to_string(),
            })
    }

    async fn find_all(
        &self,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<Vec<<Self::Entity as EntityTrait>::Model>> {
        let filtered = apply(Self::Entity::find());
        let mut ordered = match order {
            Some((column, order)) => filtered.order_by(column, order),
            None => filtered.order_by_asc(Self::Entity::created_at_column()),
        };
        // rows stamped in the same tick fall back to key order
        for key in <Self::Entity as EntityTrait>::PrimaryKey::iter() {
            ordered = ordered.order_by_asc(key.into_column());
        }
        ordered.all(self.conn()).await.map_err(DaoLayerError::Db)
    }

    async fn update<F>(
        &self,
        id: Self::Id,
        apply: F,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        let model = self.find_by_id(id).await?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.set_updated_at(Utc::now().fixed_offset());

        active.update(self.conn()).await.map_err(DaoLayerError::Db)
    }
}
