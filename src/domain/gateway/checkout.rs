//! Checkout form parameters handed to the client.
//!
//! The client posts these fields to the gateway's checkout URL. Field names
//! follow the gateway's form contract.

use serde::{Deserialize, Serialize};

use crate::domain::membership::Member;
use crate::domain::package::Package;
use crate::domain::payment::Payment;

use super::signature::GatewaySigner;

/// Merchant-level settings shared by every checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayAccount {
    pub checkout_url: String,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
    pub sandbox: bool,
}

/// Gateway-ready form parameters for one pending payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCheckoutForm {
    pub checkout_url: String,
    pub sandbox: bool,
    pub merchant_id: String,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
    pub order_id: String,
    pub items: String,
    pub currency: String,
    /// Amount formatted with two decimals, as hashed.
    pub amount: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    /// User id, echoed back on the callback.
    pub custom_1: String,
    /// Package id, echoed back on the callback.
    pub custom_2: String,
    pub hash: String,
}

impl GatewayCheckoutForm {
    pub fn build(
        account: &GatewayAccount,
        signer: &GatewaySigner,
        payment: &Payment,
        package: &Package,
        member: &Member,
    ) -> Self {
        let profile = &member.profile;
        Self {
            checkout_url: account.checkout_url.clone(),
            sandbox: account.sandbox,
            merchant_id: signer.merchant_id().to_string(),
            return_url: account.return_url.clone(),
            cancel_url: account.cancel_url.clone(),
            notify_url: account.notify_url.clone(),
            order_id: payment.order_id.to_string(),
            items: package.name.clone(),
            currency: payment.currency.clone(),
            amount: payment.amount.to_gateway_string(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            city: profile.city.clone().unwrap_or_default(),
            country: profile.country.clone().unwrap_or_else(|| "Sri Lanka".to_string()),
            custom_1: member.id.to_string(),
            custom_2: package.id.to_string(),
            hash: signer.checkout_hash(payment.order_id.as_str(), payment.amount, &payment.currency),
        }
    }

    /// Form fields in submission order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("merchant_id", self.merchant_id.clone()),
            ("return_url", self.return_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("notify_url", self.notify_url.clone()),
            ("order_id", self.order_id.clone()),
            ("items", self.items.clone()),
            ("currency", self.currency.clone()),
            ("amount", self.amount.clone()),
            ("first_name", self.first_name.clone()),
            ("last_name", self.last_name.clone()),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("address", self.address.clone()),
            ("city", self.city.clone()),
            ("country", self.country.clone()),
            ("custom_1", self.custom_1.clone()),
            ("custom_2", self.custom_2.clone()),
            ("hash", self.hash.clone()),
        ]
    }
}
