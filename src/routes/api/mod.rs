pub mod health;
pub mod lists;
pub mod payload;
mod router;
pub mod todos;

pub use router::router;
