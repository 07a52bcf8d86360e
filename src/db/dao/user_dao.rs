use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::user::{self, Entity as User};

pub struct UserDao<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> UserDao<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> DaoBase for UserDao<'_, C> {
    type Entity = User;
    type Conn = C;
    type Id = String;

    const ENTITY: &'static str = "User";

    fn conn(&self) -> &C {
        self.conn
    }
}

impl<C: ConnectionTrait> UserDao<'_, C> {
    pub async fn create_user(&self, list_id: &str, id: &str) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            id: Set(id.to_string()),
            list_id: Set(list_id.to_string()),
            display_name: Set(String::new()),
            ..Default::default()
        };
        self.create(model).await
    }

    /// Resolves a user only when it belongs to `list_id`.
    pub async fn find_member(&self, list_id: &str, user_id: &str) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::ListId.eq(list_id))
            .one(self.conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn list_members(&self, list_id: &str) -> DaoResult<Vec<user::Model>> {
        let list_id = list_id.to_string();
        self.find_all(None, move |query| {
            query.filter(user::Column::ListId.eq(list_id))
        })
        .await
    }

    pub async fn count_members(&self, list_id: &str) -> DaoResult<u64> {
        User::find()
            .filter(user::Column::ListId.eq(list_id))
            .count(self.conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn rename(&self, user_id: &str, display_name: &str) -> DaoResult<user::Model> {
        let display_name = display_name.to_string();
        self.update(user_id.to_string(), move |active| {
            active.display_name = Set(display_name);
        })
        .await
    }

    pub async fn delete_members(&self, list_id: &str) -> DaoResult<u64> {
        let result = User::delete_many()
            .filter(user::Column::ListId.eq(list_id))
            .exec(self.conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    use super::UserDao;
    use crate::db::{dao::DaoLayerError, entities::user};

    fn member(id: &str, list_id: &str) -> user::Model {
        let now = FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid");
        user::Model {
            id: id.to_string(),
            list_id: list_id.to_string(),
            display_name: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn find_member_returns_none_for_foreign_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let found = dao
            .find_member("list-a", "user-from-list-b")
            .await
            .expect("query should succeed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn list_members_returns_rows_in_query_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[member("u1", "list-a"), member("u2", "list-a")]])
            .into_connection();
        let dao = UserDao::new(&db);

        let members = dao
            .list_members("list-a")
            .await
            .expect("query should succeed");
        let ids: Vec<_> = members.iter().map(|user| user.id.as_str()).collect();
        assert_eq!(ids, ["u1", "u2"]);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(
            sql.contains(r#"ORDER BY "users"."created_at" ASC, "users"."id" ASC"#),
            "members created in the same tick need a stable order: {sql}"
        );
    }

    #[tokio::test]
    async fn count_members_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("count failed".to_string())])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .count_members("list-a")
            .await
            .expect_err("count should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
