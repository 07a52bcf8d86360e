use sea_orm::DatabaseConnection;

use crate::{
    services::{list_locks::ListLocks, list_service::ListService},
    state::AppState,
};

/// Builds services over the storage handle and lock registry owned by the
/// composition root.
#[derive(Clone)]
pub struct ServiceContext {
    db: DatabaseConnection,
    locks: ListLocks,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, locks: &ListLocks) -> Self {
        Self {
            db: db.clone(),
            locks: locks.clone(),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, &state.locks)
    }

    pub fn lists(&self) -> ListService {
        ListService::new(self.db.clone(), self.locks.clone())
    }
}
