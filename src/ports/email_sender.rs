//! Email sender port.
//!
//! Emails are advisory. Callers dispatch them without awaiting completion
//! and only log failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

/// Transactional emails sent by the membership core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    MembershipActivated,
    PaymentReceipt,
    PaymentFailed,
    MembershipReminder,
    MembershipExpired,
    GracePeriodEnding,
    MembershipSuspended,
}

impl EmailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailTemplate::MembershipActivated => "membership_activated",
            EmailTemplate::PaymentReceipt => "payment_receipt",
            EmailTemplate::PaymentFailed => "payment_failed",
            EmailTemplate::MembershipReminder => "membership_reminder",
            EmailTemplate::MembershipExpired => "membership_expired",
            EmailTemplate::GracePeriodEnding => "grace_period_ending",
            EmailTemplate::MembershipSuspended => "membership_suspended",
        }
    }
}

/// One email to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub template: EmailTemplate,
    pub recipient: String,
    /// Template variables.
    pub data: serde_json::Value,
}

impl EmailMessage {
    pub fn new(template: EmailTemplate, recipient: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            template,
            recipient: recipient.into(),
            data,
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends one email.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryFailed` when the provider rejects or cannot be reached.
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError>;
}
