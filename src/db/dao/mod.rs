pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod list_dao;
pub mod status_dao;
pub mod todo_dao;
pub mod user_dao;

pub use base::DaoBase;
pub use base_traits::{HasCreatedAtColumn, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use list_dao::ListDao;
pub use status_dao::StatusDao;
pub use todo_dao::{NewTodo, TodoDao};
pub use user_dao::UserDao;
