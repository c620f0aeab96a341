//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    CancelStalePaymentsCommand, CancelStalePaymentsHandler, CancelStalePaymentsResult,
    InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult,
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult,
    RunLifecycleSweepCommand, RunLifecycleSweepHandler, SideEffects, SweepReport, WebhookAck,
};
