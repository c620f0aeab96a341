//! Scheduled jobs.
//!
//! - `start_lifecycle_scheduler` - daily sweep, plus stale payment
//!   cancellation when it is configured

mod lifecycle;

pub use lifecycle::{start_lifecycle_scheduler, SchedulerError, STALE_PAYMENT_CRON};
