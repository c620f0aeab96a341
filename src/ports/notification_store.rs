//! Notification store port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, NotificationId};
use crate::domain::membership::NewNotification;

/// Persists in-app notifications for members.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, notification: &NewNotification) -> Result<NotificationId, DomainError>;
}
