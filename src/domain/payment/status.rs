//! Payment status state machine.
//!
//! A payment is created `Pending` and reaches one outcome. Two outcomes can
//! still move:
//!
//! - `Success -> Refunded` when the gateway reports a chargeback on money
//!   already settled
//! - `Cancelled -> Success` when the gateway settles a payment that stale
//!   cleanup cancelled; `Payment::mark_success` refuses it for payments the
//!   gateway itself cancelled

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Status of one payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created at initiation, awaiting the gateway callback.
    Pending,
    /// Gateway confirmed the charge.
    Success,
    /// Gateway reported a failed charge.
    Failed,
    /// Buyer cancelled at the gateway, or stale cleanup gave up on it.
    Cancelled,
    /// Money returned (chargeback).
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Success)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Pending, Refunded)
                | (Success, Refunded)
                | (Cancelled, Success)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Success, Failed, Cancelled, Refunded],
            Success => vec![Refunded],
            Cancelled => vec![Success],
            Failed | Refunded => vec![],
        }
    }
}
