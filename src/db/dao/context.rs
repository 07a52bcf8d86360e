use sea_orm::ConnectionTrait;

use super::{ListDao, StatusDao, TodoDao, UserDao};

/// Hands out DAOs bound to one storage handle: the pool for plain reads or
/// an open transaction for atomic multi-row writes.
pub struct DaoContext<'c, C> {
    conn: &'c C,
}

impl<C> Clone for DaoContext<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for DaoContext<'_, C> {}

impl<'c, C: ConnectionTrait> DaoContext<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub fn list(&self) -> ListDao<'c, C> {
        ListDao::new(self.conn)
    }

    pub fn user(&self) -> UserDao<'c, C> {
        UserDao::new(self.conn)
    }

    pub fn todo(&self) -> TodoDao<'c, C> {
        TodoDao::new(self.conn)
    }

    pub fn status(&self) -> StatusDao<'c, C> {
        StatusDao::new(self.conn)
    }
}
