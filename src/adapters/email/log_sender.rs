//! Log-only email sender, used when no provider key is configured.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::ports::{EmailMessage, EmailSender};

use super::templates::render;

pub struct LogEmailSender {
    brand: String,
}

impl LogEmailSender {
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
        }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        let rendered = render(message, &self.brand);
        tracing::info!(
            template = message.template.as_str(),
            subject = %rendered.subject,
            "Email provider not configured, message logged only"
        );
        Ok(())
    }
}
