//! PostgreSQL notification store.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, NotificationId};
use crate::domain::membership::NewNotification;
use crate::ports::NotificationStore;

use super::rows::db_error;

pub struct PostgresNotificationStore {
    pool: PgPool,
}

impl PostgresNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PostgresNotificationStore {
    async fn create(&self, notification: &NewNotification) -> Result<NotificationId, DomainError> {
        let id = NotificationId::new();
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, notification_type, priority, title, message, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id.as_uuid())
        .bind(notification.user_id.as_uuid())
        .bind(notification.notification_type.as_str())
        .bind(notification.priority.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(Json(&notification.metadata))
        .execute(&self.pool)
        .await
        .map_err(db_error("create notification"))?;

        Ok(id)
    }
}
