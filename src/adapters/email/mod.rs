//! Email adapters.
//!
//! - `ResendEmailSender` - production sender over the Resend HTTP API
//! - `LogEmailSender` - fallback when no API key is configured
//! - `RecordingEmailSender` - captures messages in tests

mod log_sender;
mod recording;
mod resend;
mod templates;

pub use log_sender::LogEmailSender;
pub use recording::RecordingEmailSender;
pub use resend::ResendEmailSender;
pub use templates::{render, RenderedEmail};
