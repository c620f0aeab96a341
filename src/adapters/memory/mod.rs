//! In-memory adapters.
//!
//! Used by the test suites and by local runs without a database.

mod notification_store;
mod store;

pub use notification_store::InMemoryNotificationStore;
pub use store::InMemoryStore;
