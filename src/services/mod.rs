pub mod aggregator;
pub mod context;
pub mod fanout;
pub mod list_locks;
pub mod list_service;
pub mod membership;
pub mod transaction;

pub use aggregator::{StatusAggregator, StatusChange};
pub use context::ServiceContext;
pub use fanout::FanOut;
pub use list_locks::ListLocks;
pub use list_service::{ListService, ListSnapshot, PurgeSummary, TodoWithStatuses};
pub use membership::MembershipGuard;
