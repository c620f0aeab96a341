//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `package` - Package catalog entries with pricing and capacity
//! - `payment` - Payment ledger entries and their state machine
//! - `membership` - Members, membership state machine and settlement rules
//! - `gateway` - Payment gateway signatures, callbacks and checkout forms

pub mod foundation;
pub mod gateway;
pub mod membership;
pub mod package;
pub mod payment;
