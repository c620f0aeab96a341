//! Membership handlers.
//!
//! ## Commands
//! - Initiating a package payment
//! - Reconciling gateway callbacks
//! - Running the daily lifecycle sweep
//! - Cancelling stale pending payments (optional)

mod cancel_stale_payments;
mod initiate_payment;
mod reconcile_payment;
mod run_lifecycle_sweep;
mod side_effects;

pub use cancel_stale_payments::{
    CancelStalePaymentsCommand, CancelStalePaymentsHandler, CancelStalePaymentsResult,
};
pub use initiate_payment::{
    InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult,
    DEFAULT_DUPLICATE_WINDOW_MINUTES,
};
pub use reconcile_payment::{
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult, WebhookAck,
};
pub use run_lifecycle_sweep::{RunLifecycleSweepCommand, RunLifecycleSweepHandler, SweepReport};
pub use side_effects::SideEffects;
