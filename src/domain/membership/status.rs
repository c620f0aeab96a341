//! Membership status state machine.
//!
//! Defines all membership states and the transitions the payment
//! reconciler and the lifecycle sweeper are allowed to apply.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Membership status of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Never paid. No access.
    #[default]
    Inactive,

    /// Paid membership with an end date in the future at activation.
    Active,

    /// Membership ended; access continues for the grace window.
    /// The package slot is still held.
    GracePeriod,

    /// Grace window over or payment charged back. No access.
    /// A new successful payment reactivates.
    Expired,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Inactive => "inactive",
            MembershipStatus::Active => "active",
            MembershipStatus::GracePeriod => "grace_period",
            MembershipStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inactive" => Some(MembershipStatus::Inactive),
            "active" => Some(MembershipStatus::Active),
            "grace_period" => Some(MembershipStatus::GracePeriod),
            "expired" => Some(MembershipStatus::Expired),
            _ => None,
        }
    }

    /// True while the member holds a package slot.
    pub fn holds_slot(&self) -> bool {
        matches!(self, MembershipStatus::Active | MembershipStatus::GracePeriod)
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for MembershipStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use MembershipStatus::*;
        matches!(
            (self, target),
            // Successful payment
            (Inactive, Active)
                | (Expired, Active)
                | (GracePeriod, Active) // Renewal during grace
                | (Active, Active) // Renewal
            // Sweep
                | (Active, GracePeriod)
                | (GracePeriod, Expired)
            // Chargeback
                | (Active, Expired)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MembershipStatus::*;
        match self {
            Inactive => vec![Active],
            Active => vec![Active, GracePeriod, Expired],
            GracePeriod => vec![Active, Expired],
            Expired => vec![Active],
        }
    }

    fn is_terminal(&self) -> bool {
        false
    }
}
