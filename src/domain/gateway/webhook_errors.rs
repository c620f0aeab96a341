//! Error types for gateway callback handling.
//!
//! Defines every error condition of payment reconciliation, with HTTP
//! status code mapping and retryability semantics.

use http::StatusCode;
use thiserror::Error;

/// Errors that occur while reconciling a gateway callback.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Recomputed signature does not match `md5sig`.
    #[error("Invalid signature")]
    InvalidSignature,

    /// No payment exists for the callback's order id.
    #[error("Unknown order: {0}")]
    UnknownOrder(String),

    /// Callback payload could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Callback was acknowledged without changing state.
    #[error("Callback ignored: {0}")]
    Ignored(String),

    /// Storage failed; nothing was committed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the gateway should deliver this callback again.
    ///
    /// Only storage failures qualify: the transaction rolled back, so a
    /// retry can still apply the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// Maps the error to the status code answered to the gateway.
    ///
    /// - 2xx: acknowledged, no retry
    /// - 4xx: rejected, no retry
    /// - 5xx: gateway retries
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::UnknownOrder(_)
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
