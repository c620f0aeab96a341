//! Package catalog domain module.
//!
//! - `aggregate` - Package entity with pricing and capacity counters
//! - `plan` - PlanCategory derived from package duration

mod aggregate;
mod plan;

pub use aggregate::{Package, SlotClaim};
pub use plan::PlanCategory;
