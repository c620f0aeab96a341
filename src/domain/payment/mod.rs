//! Payment ledger domain module.
//!
//! - `aggregate` - Payment entry and gateway correlation data
//! - `order_id` - OrderId business key
//! - `status` - PaymentStatus state machine

mod aggregate;
mod order_id;
mod status;

pub use aggregate::{GatewayReceipt, Payment, RefundDetails};
pub use order_id::OrderId;
pub use status::PaymentStatus;
