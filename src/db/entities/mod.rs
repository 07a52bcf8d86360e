#[allow(unused_imports)]
pub mod prelude {
    pub use super::list::Entity as List;
    pub use super::todo::Entity as Todo;
    pub use super::todo_user_status::Entity as TodoUserStatus;
    pub use super::user::Entity as User;
}

pub mod list;
pub mod todo;
pub mod todo_user_status;
pub mod user;

pub use todo::Priority;
