//! Best-effort side effects of membership transitions.
//!
//! Notifications are awaited but their failures are only logged. Emails are
//! dispatched on a detached task so a slow provider never delays the caller.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::membership::{Member, NewNotification};
use crate::ports::{EmailMessage, EmailSender, EmailTemplate, NotificationStore};

/// Dispatches notifications and emails without failing the caller.
#[derive(Clone)]
pub struct SideEffects {
    notifications: Arc<dyn NotificationStore>,
    email: Arc<dyn EmailSender>,
}

impl SideEffects {
    pub fn new(notifications: Arc<dyn NotificationStore>, email: Arc<dyn EmailSender>) -> Self {
        Self {
            notifications,
            email,
        }
    }

    /// Stores a notification. Failures are logged and swallowed.
    pub async fn notify(&self, notification: NewNotification) {
        if let Err(e) = self.notifications.create(&notification).await {
            tracing::warn!(
                error = %e,
                user_id = %notification.user_id,
                notification_type = notification.notification_type.as_str(),
                "Failed to store notification"
            );
        }
    }

    /// Sends an email to `member` on a detached task, unless the member
    /// opted out of email.
    ///
    /// The returned handle may be dropped; it only exists so tests can wait
    /// for delivery.
    pub fn email_member(
        &self,
        member: &Member,
        template: EmailTemplate,
        data: serde_json::Value,
    ) -> Option<JoinHandle<()>> {
        if !member.preferences.email_enabled {
            tracing::debug!(
                user_id = %member.id,
                template = template.as_str(),
                "Member opted out of email, skipping"
            );
            return None;
        }
        if member.profile.email.trim().is_empty() {
            tracing::warn!(
                user_id = %member.id,
                template = template.as_str(),
                "Member has no email address, skipping"
            );
            return None;
        }
        Some(self.dispatch(EmailMessage::new(template, member.profile.email.clone(), data)))
    }

    /// Sends an email on a detached task, logging failures.
    pub fn dispatch(&self, message: EmailMessage) -> JoinHandle<()> {
        let sender = Arc::clone(&self.email);
        tokio::spawn(async move {
            if let Err(e) = sender.send(&message).await {
                tracing::error!(
                    error = %e,
                    to = %message.recipient,
                    template = message.template.as_str(),
                    "Failed to send email - non-fatal"
                );
            }
        })
    }
}
