//! InitiatePaymentHandler - Command handler for starting a package purchase.
//!
//! Validates the purchase, records a pending payment and returns the signed
//! checkout form the client posts to the gateway.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::foundation::{PackageId, Timestamp, UserId};
use crate::domain::gateway::{GatewayAccount, GatewayCheckoutForm, GatewaySigner};
use crate::domain::membership::MembershipError;
use crate::domain::payment::{OrderId, Payment};
use crate::ports::{MemberRepository, PackageRepository, PaymentRepository, SaveResult};

/// Default window in which a second initiation is treated as a duplicate.
pub const DEFAULT_DUPLICATE_WINDOW_MINUTES: i64 = 30;

/// Command to initiate a payment.
#[derive(Debug, Clone)]
pub struct InitiatePaymentCommand {
    pub user_id: UserId,
    pub package_id: PackageId,
}

/// Result of a successful initiation.
#[derive(Debug, Clone)]
pub struct InitiatePaymentResult {
    pub payment: Payment,
    pub form: GatewayCheckoutForm,
}

/// Handler for payment initiation.
pub struct InitiatePaymentHandler {
    packages: Arc<dyn PackageRepository>,
    members: Arc<dyn MemberRepository>,
    payments: Arc<dyn PaymentRepository>,
    signer: GatewaySigner,
    account: GatewayAccount,
    currency: String,
    duplicate_window: Duration,
}

impl InitiatePaymentHandler {
    pub fn new(
        packages: Arc<dyn PackageRepository>,
        members: Arc<dyn MemberRepository>,
        payments: Arc<dyn PaymentRepository>,
        signer: GatewaySigner,
        account: GatewayAccount,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            packages,
            members,
            payments,
            signer,
            account,
            currency: currency.into(),
            duplicate_window: Duration::minutes(DEFAULT_DUPLICATE_WINDOW_MINUTES),
        }
    }

    pub fn with_duplicate_window(mut self, window: Duration) -> Self {
        self.duplicate_window = window;
        self
    }

    pub async fn handle(
        &self,
        cmd: InitiatePaymentCommand,
    ) -> Result<InitiatePaymentResult, MembershipError> {
        let now = Timestamp::now();

        // 1. Package must exist, be on sale and have room
        let package = self
            .packages
            .find_by_id(&cmd.package_id)
            .await?
            .ok_or(MembershipError::PackageNotFound(cmd.package_id))?;
        if !package.is_active {
            return Err(MembershipError::PackageInactive(package.id));
        }
        if !package.has_capacity() {
            return Err(MembershipError::PackageFull(package.id));
        }

        // 2. Member must exist without a running membership
        let member = self
            .members
            .find_by_id(&cmd.user_id)
            .await?
            .ok_or(MembershipError::MemberNotFound(cmd.user_id))?;
        if member.membership.is_currently_active(now) {
            return Err(MembershipError::MembershipStillActive {
                days_remaining: member.membership.days_remaining(now),
            });
        }

        // 3. No recent pending attempt (double-clicked "pay")
        let since = now.minus(self.duplicate_window);
        if let Some(existing) = self
            .payments
            .find_pending_for_user_since(&member.id, since)
            .await?
        {
            return Err(MembershipError::PendingPaymentExists {
                order_id: existing.order_id,
            });
        }

        // 4. Record the pending payment
        let payment = Payment::initiate(
            member.id,
            package.id,
            OrderId::generate(&member.id, now),
            package.discounted_amount(),
            self.currency.clone(),
            now,
        );
        if self.payments.save(&payment).await? == SaveResult::AlreadyExists {
            return Err(MembershipError::infrastructure(format!(
                "Order id collision: {}",
                payment.order_id
            )));
        }

        let form =
            GatewayCheckoutForm::build(&self.account, &self.signer, &payment, &package, &member);

        tracing::info!(
            order_id = %payment.order_id,
            user_id = %member.id,
            package_id = %package.id,
            amount = %payment.amount,
            "Payment initiated"
        );

        Ok(InitiatePaymentResult { payment, form })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::Money;
    use crate::domain::membership::{Member, MemberProfile, MembershipStatus};
    use crate::domain::package::Package;
    use crate::domain::payment::PaymentStatus;
    use secrecy::SecretString;

    fn account() -> GatewayAccount {
        GatewayAccount {
            checkout_url: "https://sandbox.payhere.lk/pay/checkout".to_string(),
            return_url: "https://gym.example/return".to_string(),
            cancel_url: "https://gym.example/cancel".to_string(),
            notify_url: "https://api.gym.example/notify".to_string(),
            sandbox: true,
        }
    }

    fn handler(store: &Arc<InMemoryStore>) -> InitiatePaymentHandler {
        InitiatePaymentHandler::new(
            store.clone(),
            store.clone(),
            store.clone(),
            GatewaySigner::new("1211149", SecretString::new("secret".to_string())),
            account(),
            "LKR",
        )
    }

    async fn seed(store: &InMemoryStore, max: Option<u32>) -> (Member, Package) {
        let member = Member::new(
            UserId::new(),
            MemberProfile {
                first_name: "Nimal".to_string(),
                last_name: "Perera".to_string(),
                email: "nimal@example.com".to_string(),
                ..Default::default()
            },
        );
        let package =
            Package::new("Gold", Money::from_major(9000).unwrap(), 3, Some(11), max).unwrap();
        store.put_member(member.clone()).await;
        store.put_package(package.clone()).await;
        (member, package)
    }

    fn cmd(member: &Member, package: &Package) -> InitiatePaymentCommand {
        InitiatePaymentCommand {
            user_id: member.id,
            package_id: package.id,
        }
    }

    #[tokio::test]
    async fn creates_pending_payment_with_discounted_amount() {
        let store = Arc::new(InMemoryStore::new());
        let (member, package) = seed(&store, None).await;

        let result = handler(&store).handle(cmd(&member, &package)).await.unwrap();

        assert_eq!(result.payment.status, PaymentStatus::Pending);
        assert_eq!(result.payment.amount.to_gateway_string(), "8010.00");
        assert_eq!(result.form.amount, "8010.00");
        assert_eq!(result.form.order_id, result.payment.order_id.to_string());
        assert!(result.form.order_id.starts_with("ORDER_"));
        assert!(store.payment(&result.payment.order_id).await.is_some());
    }

    #[tokio::test]
    async fn unknown_package_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let (member, _) = seed(&store, None).await;
        let missing = PackageId::new();

        let err = handler(&store)
            .handle(InitiatePaymentCommand {
                user_id: member.id,
                package_id: missing,
            })
            .await
            .unwrap_err();
        assert_eq!(err, MembershipError::PackageNotFound(missing));
    }

    #[tokio::test]
    async fn inactive_package_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let (member, mut package) = seed(&store, None).await;
        package.is_active = false;
        store.put_package(package.clone()).await;

        let err = handler(&store).handle(cmd(&member, &package)).await.unwrap_err();
        assert_eq!(err, MembershipError::PackageInactive(package.id));
    }

    #[tokio::test]
    async fn full_package_is_rejected_before_any_payment_is_created() {
        let store = Arc::new(InMemoryStore::new());
        let (member, mut package) = seed(&store, Some(2)).await;
        package.current_members = 2;
        store.put_package(package.clone()).await;

        let err = handler(&store).handle(cmd(&member, &package)).await.unwrap_err();

        assert_eq!(err, MembershipError::PackageFull(package.id));
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_member_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let (_, package) = seed(&store, None).await;
        let stranger = UserId::new();

        let err = handler(&store)
            .handle(InitiatePaymentCommand {
                user_id: stranger,
                package_id: package.id,
            })
            .await
            .unwrap_err();
        assert_eq!(err, MembershipError::MemberNotFound(stranger));
    }

    #[tokio::test]
    async fn active_membership_reports_days_remaining() {
        let store = Arc::new(InMemoryStore::new());
        let (mut member, package) = seed(&store, None).await;
        let now = Timestamp::now();
        member.membership.status = MembershipStatus::Active;
        member.membership.end_date = Some(now.add_days(12).minus(Duration::hours(1)));
        store.put_member(member.clone()).await;

        let err = handler(&store).handle(cmd(&member, &package)).await.unwrap_err();
        assert_eq!(err, MembershipError::MembershipStillActive { days_remaining: 12 });
    }

    #[tokio::test]
    async fn lapsed_active_membership_may_renew() {
        let store = Arc::new(InMemoryStore::new());
        let (mut member, package) = seed(&store, None).await;
        member.membership.status = MembershipStatus::Active;
        member.membership.end_date = Some(Timestamp::now().add_days(-1));
        store.put_member(member.clone()).await;

        assert!(handler(&store).handle(cmd(&member, &package)).await.is_ok());
    }

    #[tokio::test]
    async fn second_initiation_within_window_surfaces_existing_order() {
        let store = Arc::new(InMemoryStore::new());
        let (member, package) = seed(&store, None).await;
        let h = handler(&store);

        let first = h.handle(cmd(&member, &package)).await.unwrap();
        let err = h.handle(cmd(&member, &package)).await.unwrap_err();

        assert_eq!(
            err,
            MembershipError::PendingPaymentExists {
                order_id: first.payment.order_id
            }
        );
        assert_eq!(store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn old_pending_payment_does_not_block() {
        let store = Arc::new(InMemoryStore::new());
        let (member, package) = seed(&store, None).await;
        let h = handler(&store).with_duplicate_window(Duration::zero());

        h.handle(cmd(&member, &package)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(h.handle(cmd(&member, &package)).await.is_ok());
        assert_eq!(store.payment_count().await, 2);
    }
}
