//! Membership domain module.
//!
//! Per-member membership state, the transitions driven by payments and by
//! the daily lifecycle sweep, and the notifications they produce.
//!
//! # Module Structure
//!
//! - `member` - Member aggregate (profile, preferences, membership)
//! - `state` - Embedded MembershipState and access checks
//! - `status` - MembershipStatus state machine
//! - `window` - Membership dates bought by one payment
//! - `settlement` - Payment success and chargeback rules across aggregates
//! - `notification` - Notification records
//! - `errors` - Initiation error taxonomy

mod errors;
mod member;
mod notification;
mod settlement;
mod state;
mod status;
mod window;

pub use errors::MembershipError;
pub use member::{
    Member, MemberProfile, NotificationPreferences, SlotChange, DEFAULT_REMINDER_DAYS,
};
pub use notification::{NewNotification, NotificationPriority, NotificationType};
pub use settlement::{charge_back, settle_payment, Settlement, CHARGEBACK_REASON};
pub use state::MembershipState;
pub use status::MembershipStatus;
pub use window::{MembershipWindow, GRACE_PERIOD_DAYS};
