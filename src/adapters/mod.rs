//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-process store (tests, local runs)
//! - `postgres` - PostgreSQL persistence
//! - `email` - Transactional email senders
//! - `scheduler` - Cron jobs driving the lifecycle handlers

pub mod email;
pub mod memory;
pub mod postgres;
pub mod scheduler;
