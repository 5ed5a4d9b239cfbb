pub mod dashboard;
pub mod store;

pub use dashboard::{DashboardService, SubscriberHandle};
pub use store::{keys, MemoryStore};
