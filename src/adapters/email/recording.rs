//! Recording email sender for tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EmailMessage, EmailSender};

/// Keeps every delivered message. A failing sender counts attempts and
/// rejects them all.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    attempts: Mutex<usize>,
    fail: bool,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn attempts(&self) -> usize {
        *self.attempts.lock().await
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        *self.attempts.lock().await += 1;
        if self.fail {
            return Err(DomainError::new(ErrorCode::DeliveryFailed, "Simulated delivery failure"));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}
