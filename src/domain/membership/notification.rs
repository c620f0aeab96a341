//! In-app notifications created by the reconciler and the sweeper.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    PaymentSuccess,
    PaymentFailed,
    PaymentChargeback,
    MembershipReminder,
    MembershipExpired,
    GracePeriodEnding,
    MembershipSuspended,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::PaymentSuccess => "payment_success",
            NotificationType::PaymentFailed => "payment_failed",
            NotificationType::PaymentChargeback => "payment_chargeback",
            NotificationType::MembershipReminder => "membership_reminder",
            NotificationType::MembershipExpired => "membership_expired",
            NotificationType::GracePeriodEnding => "grace_period_ending",
            NotificationType::MembershipSuspended => "membership_suspended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }
}

/// Notification to be stored for a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: UserId,
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl NewNotification {
    pub fn new(
        user_id: UserId,
        notification_type: NotificationType,
        priority: NotificationPriority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            priority,
            title: title.into(),
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_collected() {
        let n = NewNotification::new(
            UserId::new(),
            NotificationType::PaymentSuccess,
            NotificationPriority::High,
            "Payment successful",
            "Your membership is active",
        )
        .with_metadata("order_id", "ORDER_1_x")
        .with_metadata("amount", 8010.0);

        assert_eq!(n.metadata.len(), 2);
        assert_eq!(n.metadata["order_id"], serde_json::json!("ORDER_1_x"));
    }

    #[test]
    fn type_serializes_snake_case() {
        let json = serde_json::to_string(&NotificationType::GracePeriodEnding).unwrap();
        assert_eq!(json, "\"grace_period_ending\"");
        assert_eq!(NotificationType::GracePeriodEnding.as_str(), "grace_period_ending");
    }

    #[test]
    fn priorities_are_ordered() {
        assert!(NotificationPriority::Urgent > NotificationPriority::High);
        assert!(NotificationPriority::Medium > NotificationPriority::Low);
    }
}
