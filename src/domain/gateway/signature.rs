//! Gateway hash scheme.
//!
//! The gateway authenticates both the checkout form and its callbacks with a
//! two-stage MD5 digest:
//!
//! ```text
//! hashed_secret = UPPER(HEX(MD5(merchant_secret)))
//! checkout      = UPPER(HEX(MD5(merchant_id + order_id + amount + currency + hashed_secret)))
//! callback      = UPPER(HEX(MD5(merchant_id + order_id + amount + currency + status_code + hashed_secret)))
//! ```
//!
//! `amount` is always formatted with two decimals (`8010.00`).

use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::domain::foundation::Money;

use super::notification::GatewayNotification;
use super::webhook_errors::WebhookError;

/// Computes and verifies gateway hashes for one merchant account.
#[derive(Clone)]
pub struct GatewaySigner {
    merchant_id: String,
    merchant_secret: SecretString,
}

impl std::fmt::Debug for GatewaySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySigner")
            .field("merchant_id", &self.merchant_id)
            .field("merchant_secret", &"[REDACTED]")
            .finish()
    }
}

impl GatewaySigner {
    pub fn new(merchant_id: impl Into<String>, merchant_secret: SecretString) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            merchant_secret,
        }
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// Hash placed in the checkout form.
    pub fn checkout_hash(&self, order_id: &str, amount: Money, currency: &str) -> String {
        let amount = amount.to_gateway_string();
        self.digest(&[&self.merchant_id, order_id, &amount, currency])
    }

    /// Hash the gateway sends as `md5sig`, recomputed from callback fields.
    pub fn callback_hash(
        &self,
        merchant_id: &str,
        order_id: &str,
        amount: &str,
        currency: &str,
        status_code: i32,
    ) -> String {
        let status_code = status_code.to_string();
        self.digest(&[merchant_id, order_id, amount, currency, &status_code])
    }

    /// Verifies a callback against its own fields.
    ///
    /// Comparison is case-insensitive and constant-time. A callback
    /// addressed to another merchant never verifies.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidSignature` on any mismatch.
    pub fn verify(&self, notification: &GatewayNotification) -> Result<(), WebhookError> {
        if notification.merchant_id != self.merchant_id {
            return Err(WebhookError::InvalidSignature);
        }

        let expected = self.callback_hash(
            &notification.merchant_id,
            &notification.order_id,
            &notification.payhere_amount,
            &notification.payhere_currency,
            notification.status_code,
        );
        let received = notification.md5sig.trim().to_ascii_uppercase();

        if constant_time_compare(expected.as_bytes(), received.as_bytes()) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    fn digest(&self, parts: &[&str]) -> String {
        let hashed_secret = md5_upper_hex(self.merchant_secret.expose_secret());
        let mut hasher = Md5::new();
        for part in parts {
            hasher.update(part.as_bytes());
        }
        hasher.update(hashed_secret.as_bytes());
        hex::encode_upper(hasher.finalize())
    }
}

fn md5_upper_hex(input: &str) -> String {
    hex::encode_upper(Md5::digest(input.as_bytes()))
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
