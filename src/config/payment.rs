//! Payment gateway configuration

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::gateway::{GatewayAccount, GatewaySigner};

use super::error::ValidationError;
use super::server::Environment;

/// Payment gateway configuration (merchant account and checkout URLs)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Merchant id issued by the gateway
    pub merchant_id: String,

    /// Merchant secret used for checkout and callback hashes
    pub merchant_secret: SecretString,

    /// ISO currency code charged for packages
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Gateway checkout endpoint
    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,

    /// Where the gateway sends the member after paying
    pub return_url: String,

    /// Where the gateway sends the member after cancelling
    pub cancel_url: String,

    /// Server-to-server callback URL
    pub notify_url: String,

    /// Use the gateway sandbox
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,

    /// Window in which a second initiation is rejected as a duplicate
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window_minutes: i64,

    /// Cancel pending payments older than this; unset disables auto-cancel
    pub stale_pending_cancel_after_minutes: Option<i64>,
}

impl PaymentConfig {
    pub fn account(&self) -> GatewayAccount {
        GatewayAccount {
            checkout_url: self.checkout_url.clone(),
            return_url: self.return_url.clone(),
            cancel_url: self.cancel_url.clone(),
            notify_url: self.notify_url.clone(),
            sandbox: self.sandbox,
        }
    }

    pub fn signer(&self) -> GatewaySigner {
        GatewaySigner::new(self.merchant_id.clone(), self.merchant_secret.clone())
    }

    pub fn duplicate_window(&self) -> Duration {
        Duration::minutes(self.duplicate_window_minutes)
    }

    pub fn stale_pending_max_age(&self) -> Option<Duration> {
        self.stale_pending_cancel_after_minutes.map(Duration::minutes)
    }

    /// Validate payment configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.merchant_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__MERCHANT_ID"));
        }
        if self.merchant_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__MERCHANT_SECRET"));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }

        let urls = [
            ("checkout_url", &self.checkout_url),
            ("return_url", &self.return_url),
            ("cancel_url", &self.cancel_url),
            ("notify_url", &self.notify_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidUrl(name));
            }
        }

        if *environment == Environment::Production {
            if self.sandbox {
                return Err(ValidationError::SandboxInProduction);
            }
            if urls.iter().any(|(_, url)| !url.starts_with("https://")) {
                return Err(ValidationError::GatewayUrlMustBeHttps);
            }
        }

        if self.duplicate_window_minutes < 1 {
            return Err(ValidationError::InvalidDuplicateWindow);
        }
        if matches!(self.stale_pending_cancel_after_minutes, Some(m) if m < 1) {
            return Err(ValidationError::InvalidStaleAge);
        }
        Ok(())
    }
}

fn default_currency() -> String {
    "LKR".to_string()
}

fn default_checkout_url() -> String {
    "https://sandbox.payhere.lk/pay/checkout".to_string()
}

fn default_sandbox() -> bool {
    true
}

fn default_duplicate_window() -> i64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaymentConfig {
        PaymentConfig {
            merchant_id: "1211149".to_string(),
            merchant_secret: SecretString::new("top-secret".to_string()),
            currency: default_currency(),
            checkout_url: default_checkout_url(),
            return_url: "https://gym.example.com/payment/return".to_string(),
            cancel_url: "https://gym.example.com/payment/cancel".to_string(),
            notify_url: "https://api.gym.example.com/payment/notify".to_string(),
            sandbox: true,
            duplicate_window_minutes: default_duplicate_window(),
            stale_pending_cancel_after_minutes: None,
        }
    }

    #[test]
    fn test_valid_sandbox_config() {
        assert!(config().validate(&Environment::Development).is_ok());
    }

    #[test]
    fn test_sandbox_rejected_in_production() {
        let result = config().validate(&Environment::Production);
        assert!(matches!(result, Err(ValidationError::SandboxInProduction)));
    }

    #[test]
    fn test_production_requires_https() {
        let mut config = config();
        config.sandbox = false;
        config.checkout_url = "https://www.payhere.lk/pay/checkout".to_string();
        config.notify_url = "http://api.gym.example.com/payment/notify".to_string();
        let result = config.validate(&Environment::Production);
        assert!(matches!(result, Err(ValidationError::GatewayUrlMustBeHttps)));
    }

    #[test]
    fn test_missing_secret() {
        let mut config = config();
        config.merchant_secret = SecretString::new(String::new());
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_lowercase_currency_rejected() {
        let mut config = config();
        config.currency = "lkr".to_string();
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_stale_cancellation_disabled_by_default() {
        assert!(config().stale_pending_max_age().is_none());

        let mut config = config();
        config.stale_pending_cancel_after_minutes = Some(90);
        assert_eq!(config.stale_pending_max_age(), Some(Duration::minutes(90)));
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        assert!(!format!("{:?}", config()).contains("top-secret"));
    }
}
