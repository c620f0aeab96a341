//! Shared harness for the integration suites: every handler wired to the
//! in-memory adapters.

#![allow(dead_code)]

use std::sync::Arc;

use secrecy::SecretString;

use gym_membership::adapters::email::RecordingEmailSender;
use gym_membership::adapters::memory::{InMemoryNotificationStore, InMemoryStore};
use gym_membership::application::{
    InitiatePaymentCommand, InitiatePaymentHandler, ReconcilePaymentCommand,
    ReconcilePaymentHandler, RunLifecycleSweepHandler, SideEffects,
};
use gym_membership::domain::foundation::{Money, UserId};
use gym_membership::domain::gateway::{GatewayAccount, GatewayNotification, GatewaySigner};
use gym_membership::domain::membership::{Member, MemberProfile};
use gym_membership::domain::package::Package;
use gym_membership::domain::payment::Payment;

pub const MERCHANT_ID: &str = "1211149";
pub const MERCHANT_SECRET: &str = "integration-secret";
pub const CURRENCY: &str = "LKR";

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub emails: Arc<RecordingEmailSender>,
    pub signer: GatewaySigner,
    pub initiate: InitiatePaymentHandler,
    pub reconcile: ReconcilePaymentHandler,
    pub sweep: RunLifecycleSweepHandler,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let emails = Arc::new(RecordingEmailSender::new());
        let signer = GatewaySigner::new(MERCHANT_ID, SecretString::new(MERCHANT_SECRET.to_string()));
        let effects = SideEffects::new(notifications.clone(), emails.clone());

        let account = GatewayAccount {
            checkout_url: "https://sandbox.payhere.lk/pay/checkout".to_string(),
            return_url: "https://gym.example.com/payment/return".to_string(),
            cancel_url: "https://gym.example.com/payment/cancel".to_string(),
            notify_url: "https://api.gym.example.com/payment/notify".to_string(),
            sandbox: true,
        };

        let initiate = InitiatePaymentHandler::new(
            store.clone(),
            store.clone(),
            store.clone(),
            signer.clone(),
            account,
            CURRENCY,
        );
        let reconcile =
            ReconcilePaymentHandler::new(store.clone(), store.clone(), effects.clone(), signer.clone());
        let sweep = RunLifecycleSweepHandler::new(store.clone(), store.clone(), effects);

        Self {
            store,
            notifications,
            emails,
            signer,
            initiate,
            reconcile,
            sweep,
        }
    }

    pub async fn add_member(&self, first_name: &str) -> Member {
        let member = Member::new(
            UserId::new(),
            MemberProfile {
                first_name: first_name.to_string(),
                last_name: "Perera".to_string(),
                email: format!("{}@example.com", first_name.to_lowercase()),
                city: Some("Colombo".to_string()),
                ..Default::default()
            },
        );
        self.store.put_member(member.clone()).await;
        member
    }

    pub async fn add_package(
        &self,
        price: i64,
        discount: Option<u8>,
        months: u32,
        max_members: Option<u32>,
    ) -> Package {
        let package = Package::new(
            format!("{}-month plan", months),
            Money::from_major(price).unwrap(),
            months,
            discount,
            max_members,
        )
        .unwrap();
        self.store.put_package(package.clone()).await;
        package
    }

    pub async fn initiate(&self, member: &Member, package: &Package) -> Payment {
        self.initiate
            .handle(InitiatePaymentCommand {
                user_id: member.id,
                package_id: package.id,
            })
            .await
            .unwrap()
            .payment
    }

    /// A correctly signed callback for `payment`.
    pub fn callback(&self, payment: &Payment, status_code: i32) -> ReconcilePaymentCommand {
        let order_id = payment.order_id.to_string();
        let amount = payment.amount.to_gateway_string();
        ReconcilePaymentCommand {
            notification: GatewayNotification {
                merchant_id: MERCHANT_ID.to_string(),
                md5sig: self
                    .signer
                    .callback_hash(MERCHANT_ID, &order_id, &amount, CURRENCY, status_code),
                order_id,
                payment_id: Some(format!("3200{}", payment.created_at.as_millis())),
                payhere_amount: amount,
                payhere_currency: CURRENCY.to_string(),
                status_code,
                status_message: Some("Processed by sandbox".to_string()),
                method: Some("VISA".to_string()),
                custom_1: Some(payment.user_id.to_string()),
                custom_2: Some(payment.package_id.to_string()),
                ..Default::default()
            },
        }
    }

    /// A callback signed with the wrong merchant secret.
    pub fn forged_callback(&self, payment: &Payment, status_code: i32) -> ReconcilePaymentCommand {
        let forger = GatewaySigner::new(MERCHANT_ID, SecretString::new("guessed".to_string()));
        let mut cmd = self.callback(payment, status_code);
        let n = &cmd.notification;
        cmd.notification.md5sig = forger.callback_hash(
            MERCHANT_ID,
            &n.order_id,
            &n.payhere_amount,
            CURRENCY,
            status_code,
        );
        cmd
    }
}
