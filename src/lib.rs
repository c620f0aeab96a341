//! Gym Membership - membership lifecycle and payment reconciliation core
//!
//! This crate settles package payments reported by the payment gateway,
//! keeps package capacity consistent with member state, and runs the daily
//! sweep that moves memberships through reminder, grace period and expiry.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
