//! Wiring of handlers to adapters.
//!
//! The HTTP layer that embeds this crate and the worker binary both build
//! their handlers here, so every entry point shares one configuration path.

use std::sync::Arc;

use sqlx::PgPool;

use crate::adapters::email::{LogEmailSender, ResendEmailSender};
use crate::adapters::postgres::{
    PostgresMemberRepository, PostgresMembershipTransitions, PostgresNotificationStore,
    PostgresPackageRepository, PostgresPaymentRepository,
};
use crate::application::{
    CancelStalePaymentsHandler, InitiatePaymentHandler, ReconcilePaymentHandler,
    RunLifecycleSweepHandler, SideEffects,
};
use crate::config::{AppConfig, EmailConfig, ValidationError};
use crate::ports::{
    EmailSender, MemberRepository, MembershipTransitions, NotificationStore, PackageRepository,
    PaymentRepository,
};

/// Port implementations the handlers run against.
#[derive(Clone)]
pub struct CorePorts {
    pub packages: Arc<dyn PackageRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub transitions: Arc<dyn MembershipTransitions>,
    pub notifications: Arc<dyn NotificationStore>,
    pub email: Arc<dyn EmailSender>,
}

impl CorePorts {
    /// PostgreSQL-backed ports, with the email sender chosen from config.
    pub fn postgres(pool: PgPool, email: &EmailConfig) -> Self {
        Self {
            packages: Arc::new(PostgresPackageRepository::new(pool.clone())),
            members: Arc::new(PostgresMemberRepository::new(pool.clone())),
            payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
            transitions: Arc::new(PostgresMembershipTransitions::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationStore::new(pool)),
            email: email_sender(email),
        }
    }
}

/// Resend when an API key is configured, log-only otherwise.
pub fn email_sender(config: &EmailConfig) -> Arc<dyn EmailSender> {
    match config.api_key() {
        Some(key) => Arc::new(ResendEmailSender::new(
            key.clone(),
            &config.from_email,
            &config.from_name,
        )),
        None => {
            tracing::warn!("No email provider configured, emails will only be logged");
            Arc::new(LogEmailSender::new(config.from_name.clone()))
        }
    }
}

/// Every membership handler, configured.
#[derive(Clone)]
pub struct MembershipCore {
    pub initiate_payment: Arc<InitiatePaymentHandler>,
    pub reconcile_payment: Arc<ReconcilePaymentHandler>,
    pub lifecycle_sweep: Arc<RunLifecycleSweepHandler>,
    pub cancel_stale_payments: Arc<CancelStalePaymentsHandler>,
}

impl MembershipCore {
    /// # Errors
    ///
    /// Returns a `ValidationError` when the reminder lead times do not parse.
    pub fn build(ports: CorePorts, config: &AppConfig) -> Result<Self, ValidationError> {
        let payment = &config.payment;
        let lifecycle = &config.lifecycle;
        let effects = SideEffects::new(ports.notifications.clone(), ports.email.clone());

        let initiate_payment = InitiatePaymentHandler::new(
            ports.packages.clone(),
            ports.members.clone(),
            ports.payments.clone(),
            payment.signer(),
            payment.account(),
            payment.currency.clone(),
        )
        .with_duplicate_window(payment.duplicate_window());

        let reconcile_payment = ReconcilePaymentHandler::new(
            ports.payments.clone(),
            ports.transitions.clone(),
            effects.clone(),
            payment.signer(),
        )
        .with_grace_days(lifecycle.grace_period_days);

        let lifecycle_sweep =
            RunLifecycleSweepHandler::new(ports.members.clone(), ports.transitions.clone(), effects)
                .with_reminder_days(lifecycle.reminder_days_list()?);

        let cancel_stale_payments =
            CancelStalePaymentsHandler::new(ports.payments, payment.stale_pending_max_age());

        Ok(Self {
            initiate_payment: Arc::new(initiate_payment),
            reconcile_payment: Arc::new(reconcile_payment),
            lifecycle_sweep: Arc::new(lifecycle_sweep),
            cancel_stale_payments: Arc::new(cancel_stale_payments),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::email::RecordingEmailSender;
    use crate::adapters::memory::{InMemoryNotificationStore, InMemoryStore};
    use crate::config::{DatabaseConfig, LifecycleConfig, PaymentConfig, ServerConfig};
    use secrecy::SecretString;

    fn config(reminder_days: &str) -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            payment: PaymentConfig {
                merchant_id: "1211149".to_string(),
                merchant_secret: SecretString::new("secret".to_string()),
                currency: "LKR".to_string(),
                checkout_url: "https://sandbox.payhere.lk/pay/checkout".to_string(),
                return_url: "https://gym.example.com/return".to_string(),
                cancel_url: "https://gym.example.com/cancel".to_string(),
                notify_url: "https://api.gym.example.com/notify".to_string(),
                sandbox: true,
                duplicate_window_minutes: 30,
                stale_pending_cancel_after_minutes: Some(60),
            },
            email: EmailConfig::default(),
            lifecycle: LifecycleConfig {
                reminder_days: reminder_days.to_string(),
                ..Default::default()
            },
        }
    }

    fn memory_ports() -> CorePorts {
        let store = Arc::new(InMemoryStore::new());
        CorePorts {
            packages: store.clone(),
            members: store.clone(),
            payments: store.clone(),
            transitions: store,
            notifications: Arc::new(InMemoryNotificationStore::new()),
            email: Arc::new(RecordingEmailSender::new()),
        }
    }

    #[test]
    fn builds_handlers_from_config() {
        let core = MembershipCore::build(memory_ports(), &config("7,3,1")).unwrap();
        assert!(core.cancel_stale_payments.is_enabled());
    }

    #[test]
    fn bad_reminder_days_fail_the_build() {
        assert!(MembershipCore::build(memory_ports(), &config("7,x")).is_err());
    }
}
