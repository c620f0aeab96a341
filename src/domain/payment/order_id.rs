//! Order identifier: the business key of a payment attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, UserId, ValidationError};

const PREFIX: &str = "ORDER_";

/// Unique order identifier, formatted `ORDER_<epoch-ms>_<userId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Synthesizes the order id for a payment initiated by `user_id` at `at`.
    pub fn generate(user_id: &UserId, at: Timestamp) -> Self {
        Self(format!("{}{}_{}", PREFIX, at.as_millis(), user_id))
    }

    /// Wraps an order id received from outside (e.g. a gateway callback).
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("order_id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
