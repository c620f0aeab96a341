//! Resend email sender.
//!
//! Posts rendered templates to the Resend HTTP API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{EmailMessage, EmailSender};

use super::templates::render;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Sends transactional email through Resend.
pub struct ResendEmailSender {
    client: reqwest::Client,
    api_key: SecretString,
    from: String,
    brand: String,
    endpoint: String,
}

impl ResendEmailSender {
    /// `from_name` doubles as the brand shown in templates.
    pub fn new(api_key: SecretString, from_email: &str, from_name: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from: format!("{} <{}>", from_name, from_email),
            brand: from_name.to_string(),
            endpoint: RESEND_API_URL.to_string(),
        }
    }

    /// Points the sender at another endpoint (test servers, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        let rendered = render(message, &self.brand);
        let body = serde_json::json!({
            "from": self.from,
            "to": [message.recipient],
            "subject": rendered.subject,
            "html": rendered.html,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    template = message.template.as_str(),
                    error = %e,
                    "Email provider unreachable"
                );
                DomainError::new(ErrorCode::DeliveryFailed, format!("Email request failed: {}", e))
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                template = message.template.as_str(),
                subject = %rendered.subject,
                "Email sent"
            );
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        tracing::error!(
            template = message.template.as_str(),
            status = %status,
            body = %detail,
            "Email provider rejected message"
        );
        Err(DomainError::new(
            ErrorCode::DeliveryFailed,
            format!("Email provider returned {}", status),
        ))
    }
}
