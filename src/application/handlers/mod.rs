//! Application handlers.
//!
//! Command handlers that orchestrate domain operations over ports.

pub mod membership;

pub use membership::{
    CancelStalePaymentsCommand, CancelStalePaymentsHandler, CancelStalePaymentsResult,
    InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult,
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconcilePaymentResult,
    RunLifecycleSweepCommand, RunLifecycleSweepHandler, SideEffects, SweepReport, WebhookAck,
};
