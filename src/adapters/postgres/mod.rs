//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresPackageRepository` - Package catalog
//! - `PostgresPaymentRepository` - Payment ledger (unique order id)
//! - `PostgresMemberRepository` - Member profiles and status queries
//! - `PostgresMembershipTransitions` - Row-locking multi-record transactions
//! - `PostgresNotificationStore` - In-app notifications

mod member_repository;
mod membership_transitions;
mod notification_store;
mod package_repository;
mod payment_repository;
mod rows;

pub use member_repository::PostgresMemberRepository;
pub use membership_transitions::PostgresMembershipTransitions;
pub use notification_store::PostgresNotificationStore;
pub use package_repository::PostgresPackageRepository;
pub use payment_repository::PostgresPaymentRepository;
