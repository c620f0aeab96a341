//! In-memory notification store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, NotificationId, UserId};
use crate::domain::membership::NewNotification;
use crate::ports::NotificationStore;

/// Keeps created notifications in insertion order.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    records: RwLock<Vec<(NotificationId, NewNotification)>>,
    fail: bool,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn all(&self) -> Vec<NewNotification> {
        self.records
            .read()
            .await
            .iter()
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub async fn for_user(&self, user_id: &UserId) -> Vec<NewNotification> {
        self.records
            .read()
            .await
            .iter()
            .filter(|(_, n)| n.user_id == *user_id)
            .map(|(_, n)| n.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn create(&self, notification: &NewNotification) -> Result<NotificationId, DomainError> {
        if self.fail {
            return Err(DomainError::database("Notification store unavailable"));
        }
        let id = NotificationId::new();
        self.records.write().await.push((id, notification.clone()));
        Ok(id)
    }
}
