//! Payment gateway contract.
//!
//! - `signature` - two-stage MD5 hash for checkout and callbacks
//! - `notification` - callback payload
//! - `status` - callback status codes
//! - `checkout` - checkout form parameters
//! - `webhook_errors` - reconciliation error taxonomy

mod checkout;
mod notification;
mod signature;
mod status;
mod webhook_errors;

pub use checkout::{GatewayAccount, GatewayCheckoutForm};
pub use notification::GatewayNotification;
pub use signature::GatewaySigner;
pub use status::GatewayStatus;
pub use webhook_errors::WebhookError;
