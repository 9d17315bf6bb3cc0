//! Services module for metering-service.

pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;
pub mod usage;

pub use database::Database;
pub use memory::InMemoryStorage;
pub use metrics::{get_metrics, init_metrics};
pub use store::Stores;
pub use usage::UsageService;
