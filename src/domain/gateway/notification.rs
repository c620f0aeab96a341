//! Gateway callback payload.
//!
//! The gateway posts its callback as form fields. The route layer hands the
//! decoded key/value pairs to [`GatewayNotification::from_fields`]; JSON
//! payloads deserialize directly through serde.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PackageId, UserId};
use crate::domain::payment::GatewayReceipt;

use super::status::GatewayStatus;
use super::webhook_errors::WebhookError;

/// Raw callback sent by the gateway to the notify URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayNotification {
    pub merchant_id: String,
    pub order_id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    /// Amount exactly as the gateway formatted it. Hashed verbatim.
    pub payhere_amount: String,
    pub payhere_currency: String,
    pub status_code: i32,
    pub md5sig: String,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub card_holder_name: Option<String>,
    #[serde(default)]
    pub card_no: Option<String>,
    #[serde(default)]
    pub card_expiry: Option<String>,
    /// User id echoed back from the checkout form.
    #[serde(default)]
    pub custom_1: Option<String>,
    /// Package id echoed back from the checkout form.
    #[serde(default)]
    pub custom_2: Option<String>,
}

impl GatewayNotification {
    /// Builds a notification from decoded form fields.
    ///
    /// Unknown fields are ignored. Empty optional fields become `None`.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` when a required field is missing or
    /// `status_code` is not an integer.
    pub fn from_fields<I, K, V>(fields: I) -> Result<Self, WebhookError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut n = GatewayNotification::default();
        let mut status_code: Option<i32> = None;

        for (key, value) in fields {
            let value: String = value.into();
            match key.as_ref() {
                "merchant_id" => n.merchant_id = value,
                "order_id" => n.order_id = value,
                "payment_id" => n.payment_id = non_empty(value),
                "payhere_amount" => n.payhere_amount = value,
                "payhere_currency" => n.payhere_currency = value,
                "status_code" => {
                    status_code = Some(value.trim().parse().map_err(|_| {
                        WebhookError::ParseError(format!("invalid status_code '{}'", value))
                    })?);
                }
                "md5sig" => n.md5sig = value,
                "status_message" => n.status_message = non_empty(value),
                "method" => n.method = non_empty(value),
                "card_holder_name" => n.card_holder_name = non_empty(value),
                "card_no" => n.card_no = non_empty(value),
                "card_expiry" => n.card_expiry = non_empty(value),
                "custom_1" => n.custom_1 = non_empty(value),
                "custom_2" => n.custom_2 = non_empty(value),
                _ => {}
            }
        }

        n.status_code =
            status_code.ok_or_else(|| WebhookError::ParseError("missing status_code".to_string()))?;

        for (name, value) in [
            ("merchant_id", &n.merchant_id),
            ("order_id", &n.order_id),
            ("payhere_amount", &n.payhere_amount),
            ("payhere_currency", &n.payhere_currency),
            ("md5sig", &n.md5sig),
        ] {
            if value.trim().is_empty() {
                return Err(WebhookError::ParseError(format!("missing {}", name)));
            }
        }

        Ok(n)
    }

    pub fn status(&self) -> GatewayStatus {
        GatewayStatus::from_code(self.status_code)
    }

    /// User id carried in `custom_1`, if it parses.
    pub fn user_id(&self) -> Option<UserId> {
        self.custom_1.as_deref().and_then(|raw| raw.parse().ok())
    }

    /// Package id carried in `custom_2`, if it parses.
    pub fn package_id(&self) -> Option<PackageId> {
        self.custom_2.as_deref().and_then(|raw| raw.parse().ok())
    }

    /// Correlation data to store on the payment.
    pub fn receipt(&self) -> GatewayReceipt {
        GatewayReceipt {
            gateway_payment_id: self.payment_id.clone(),
            status_code: self.status_code,
            status_message: self.status_message.clone(),
            method: self.method.clone(),
            card_holder_name: self.card_holder_name.clone(),
            card_no: self.card_no.clone(),
            card_expiry: self.card_expiry.clone(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("merchant_id", "1211149"),
            ("order_id", "ORDER_1700000000000_abc"),
            ("payment_id", "320025071278"),
            ("payhere_amount", "8010.00"),
            ("payhere_currency", "LKR"),
            ("status_code", "2"),
            ("md5sig", "ABCDEF"),
            ("status_message", "Successfully completed the payment."),
            ("method", "VISA"),
            ("card_holder_name", "N Perera"),
            ("card_no", "************1292"),
            ("card_expiry", "12/27"),
            ("custom_1", ""),
        ]
    }

    #[test]
    fn parses_form_fields() {
        let n = GatewayNotification::from_fields(fields()).unwrap();
        assert_eq!(n.order_id, "ORDER_1700000000000_abc");
        assert_eq!(n.status(), GatewayStatus::Success);
        assert_eq!(n.payment_id.as_deref(), Some("320025071278"));
        assert_eq!(n.custom_1, None);
    }

    #[test]
    fn negative_status_codes_parse() {
        let mut f = fields();
        f.retain(|(k, _)| *k != "status_code");
        f.push(("status_code", "-3"));
        let n = GatewayNotification::from_fields(f).unwrap();
        assert_eq!(n.status(), GatewayStatus::Chargeback);
    }

    #[test]
    fn missing_order_id_is_parse_error() {
        let f: Vec<_> = fields().into_iter().filter(|(k, _)| *k != "order_id").collect();
        let err = GatewayNotification::from_fields(f).unwrap_err();
        assert!(matches!(err, WebhookError::ParseError(msg) if msg == "missing order_id"));
    }

    #[test]
    fn non_numeric_status_is_parse_error() {
        let mut f = fields();
        f.retain(|(k, _)| *k != "status_code");
        f.push(("status_code", "ok"));
        assert!(GatewayNotification::from_fields(f).is_err());
    }

    #[test]
    fn custom_fields_carry_ids() {
        let user = UserId::new();
        let package = PackageId::new();
        let n = GatewayNotification {
            custom_1: Some(user.to_string()),
            custom_2: Some(package.to_string()),
            ..Default::default()
        };
        assert_eq!(n.user_id(), Some(user));
        assert_eq!(n.package_id(), Some(package));
    }

    #[test]
    fn receipt_copies_card_metadata() {
        let n = GatewayNotification::from_fields(fields()).unwrap();
        let receipt = n.receipt();
        assert_eq!(receipt.status_code, 2);
        assert_eq!(receipt.card_no.as_deref(), Some("************1292"));
        assert_eq!(receipt.method.as_deref(), Some("VISA"));
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "merchant_id": "1211149",
            "order_id": "ORDER_1_x",
            "payhere_amount": "100.00",
            "payhere_currency": "LKR",
            "status_code": -2,
            "md5sig": "ABC",
            "status_message": "Declined"
        }"#;
        let n: GatewayNotification = serde_json::from_str(json).unwrap();
        assert_eq!(n.status(), GatewayStatus::Failed);
        assert_eq!(n.status_message.as_deref(), Some("Declined"));
    }
}
