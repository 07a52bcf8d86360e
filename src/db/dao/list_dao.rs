use sea_orm::{ConnectionTrait, EntityTrait, Set};

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::list::{self, Entity as List};

pub struct ListDao<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ListDao<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> DaoBase for ListDao<'_, C> {
    type Entity = List;
    type Conn = C;
    type Id = String;

    const ENTITY: &'static str = "List";

    fn conn(&self) -> &C {
        self.conn
    }
}

impl<C: ConnectionTrait> ListDao<'_, C> {
    pub async fn create_list(&self, id: &str) -> DaoResult<list::Model> {
        let model = list::ActiveModel {
            id: Set(id.to_string()),
            memo: Set(String::new()),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_list(&self, id: &str) -> DaoResult<Option<list::Model>> {
        self.find_optional(id.to_string()).await
    }

    pub async fn require_list(&self, id: &str) -> DaoResult<list::Model> {
        self.find_by_id(id.to_string()).await
    }

    pub async fn update_memo(&self, id: &str, memo: &str) -> DaoResult<list::Model> {
        let memo = memo.to_string();
        self.update(id.to_string(), move |active| {
            active.memo = Set(memo);
        })
        .await
    }

    pub async fn delete_list(&self, id: &str) -> DaoResult<()> {
        let result = List::delete_by_id(id.to_string())
            .exec(self.conn)
            .await
            .map_err(DaoLayerError::Db)?;

        if result.rows_affected == 0 {
            return Err(DaoLayerError::NotFound {
                entity: Self::ENTITY,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
