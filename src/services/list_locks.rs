use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::AppError;

pub type ListGuard = OwnedMutexGuard<()>;

/// Per-list async locks. Mutations that change a list's membership or its
/// status rows hold the list's guard for the whole transaction; lists never
/// wait on each other.
#[derive(Clone, Default)]
pub struct ListLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ListLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, list_id: &str) -> Result<ListGuard, AppError> {
        let lock = {
            let mut locks = self
                .inner
                .lock()
                .map_err(|_| AppError::internal("list lock registry poisoned"))?;
            // only the registry holds idle entries
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(list_id.to_string()).or_default().clone()
        };

        let guard = lock.lock_owned().await;
        debug!(list_id, "list lock acquired");
        Ok(guard)
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}
