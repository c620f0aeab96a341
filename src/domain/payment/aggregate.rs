//! Payment aggregate - the ledger entry for one payment attempt.
//!
//! # Design Decisions
//!
//! - **Append/transition only**: payments are never deleted
//! - **Money in minor units**: `amount` is fixed at initiation and never recomputed
//! - **Gateway fields only from callbacks**: `gateway` is populated on webhook receipt

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, Money, PackageId, PaymentId, StateMachine, Timestamp, UserId,
};
use crate::domain::gateway::GatewayStatus;
use crate::domain::membership::MembershipWindow;

use super::{OrderId, PaymentStatus};

/// Correlation data reported by the gateway on a callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReceipt {
    pub gateway_payment_id: Option<String>,
    pub status_code: i32,
    pub status_message: Option<String>,
    pub method: Option<String>,
    pub card_holder_name: Option<String>,
    /// Masked card number as sent by the gateway.
    pub card_no: Option<String>,
    pub card_expiry: Option<String>,
}

/// Refund recorded on a chargeback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDetails {
    pub amount: Money,
    pub reason: String,
    pub refunded_at: Timestamp,
}

/// One payment attempt against a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub package_id: PackageId,
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway: Option<GatewayReceipt>,
    /// Membership dates bought by this payment; set only on success.
    pub membership_window: Option<MembershipWindow>,
    pub failure_reason: Option<String>,
    pub refund: Option<RefundDetails>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Creates a pending payment at initiation.
    pub fn initiate(
        user_id: UserId,
        package_id: PackageId,
        order_id: OrderId,
        amount: Money,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id,
            package_id,
            order_id,
            amount,
            currency: currency.into(),
            status: PaymentStatus::Pending,
            gateway: None,
            membership_window: None,
            failure_reason: None,
            refund: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == PaymentStatus::Success
    }

    /// Cancelled by stale cleanup rather than by a gateway cancel callback.
    pub fn is_cancelled_locally(&self) -> bool {
        self.status == PaymentStatus::Cancelled
            && self
                .gateway
                .as_ref()
                .map_or(true, |g| g.status_code != GatewayStatus::Cancelled.code())
    }

    /// True while a gateway success callback may still settle the payment.
    pub fn awaits_settlement(&self) -> bool {
        self.is_pending() || self.is_cancelled_locally()
    }

    /// Records a gateway "still pending" callback. No status change.
    pub fn record_pending_status(&mut self, receipt: GatewayReceipt, now: Timestamp) {
        self.gateway = Some(receipt);
        self.updated_at = now;
    }

    /// Marks the payment settled and snapshots the membership window it bought.
    ///
    /// # Errors
    ///
    /// Returns an error unless the payment is pending or was cancelled by
    /// stale cleanup.
    pub fn mark_success(
        &mut self,
        receipt: GatewayReceipt,
        window: MembershipWindow,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if !self.awaits_settlement() {
            return Err(DomainError::invalid_transition(self.status, PaymentStatus::Success));
        }
        self.transition_to(PaymentStatus::Success)?;
        self.gateway = Some(receipt);
        self.membership_window = Some(window);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the payment failed with the gateway's reason.
    pub fn mark_failed(
        &mut self,
        receipt: GatewayReceipt,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Failed)?;
        self.gateway = Some(receipt);
        self.failure_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Marks the payment cancelled by the buyer or by stale-pending cleanup.
    pub fn mark_cancelled(
        &mut self,
        receipt: Option<GatewayReceipt>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Cancelled)?;
        if receipt.is_some() {
            self.gateway = receipt;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Marks the payment refunded after a chargeback.
    pub fn mark_refunded(
        &mut self,
        receipt: GatewayReceipt,
        amount: Money,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Refunded)?;
        self.gateway = Some(receipt);
        self.refund = Some(RefundDetails {
            amount,
            reason: reason.into(),
            refunded_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    fn transition_to(&mut self, target: PaymentStatus) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| DomainError::invalid_transition(self.status, target))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn pending() -> Payment {
        let user = UserId::new();
        let now = Timestamp::now();
        Payment::initiate(
            user,
            PackageId::new(),
            OrderId::generate(&user, now),
            Money::from_major(8010).unwrap(),
            "LKR",
            now,
        )
    }

    fn receipt(code: i32) -> GatewayReceipt {
        GatewayReceipt {
            gateway_payment_id: Some("320025071278".to_string()),
            status_code: code,
            status_message: Some("Successfully completed".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn initiated_payment_is_pending_without_gateway_data() {
        let p = pending();
        assert!(p.is_pending());
        assert!(p.gateway.is_none());
        assert!(p.membership_window.is_none());
        assert!(p.refund.is_none());
    }

    #[test]
    fn success_snapshots_window() {
        let mut p = pending();
        let window = MembershipWindow::standard(Timestamp::now(), 1);
        p.mark_success(receipt(2), window, Timestamp::now()).unwrap();

        assert!(p.is_success());
        assert_eq!(p.membership_window, Some(window));
        assert_eq!(p.gateway.unwrap().status_code, 2);
    }

    #[test]
    fn second_success_is_rejected() {
        let mut p = pending();
        let window = MembershipWindow::standard(Timestamp::now(), 1);
        p.mark_success(receipt(2), window, Timestamp::now()).unwrap();

        let err = p.mark_success(receipt(2), window, Timestamp::now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn failure_records_reason() {
        let mut p = pending();
        p.mark_failed(receipt(-2), "Card declined", Timestamp::now()).unwrap();
        assert_eq!(p.status, PaymentStatus::Failed);
        assert_eq!(p.failure_reason.as_deref(), Some("Card declined"));
    }

    #[test]
    fn gateway_cancelled_payment_cannot_succeed_later() {
        let mut p = pending();
        p.mark_cancelled(Some(receipt(-1)), Timestamp::now()).unwrap();
        let window = MembershipWindow::standard(Timestamp::now(), 1);
        assert!(p.mark_success(receipt(2), window, Timestamp::now()).is_err());
        assert_eq!(p.status, PaymentStatus::Cancelled);
    }

    #[test]
    fn stale_cancelled_payment_can_still_succeed() {
        let mut p = pending();
        p.mark_cancelled(None, Timestamp::now()).unwrap();
        assert!(p.is_cancelled_locally());

        let window = MembershipWindow::standard(Timestamp::now(), 1);
        p.mark_success(receipt(2), window, Timestamp::now()).unwrap();
        assert!(p.is_success());
        assert_eq!(p.gateway.unwrap().status_code, 2);
    }

    #[test]
    fn stale_cancel_after_pending_callback_is_still_local() {
        let mut p = pending();
        p.record_pending_status(receipt(0), Timestamp::now());
        p.mark_cancelled(None, Timestamp::now()).unwrap();
        assert!(p.awaits_settlement());
    }

    #[test]
    fn chargeback_after_success_refunds() {
        let mut p = pending();
        let window = MembershipWindow::standard(Timestamp::now(), 1);
        p.mark_success(receipt(2), window, Timestamp::now()).unwrap();
        p.mark_refunded(receipt(-3), p.amount, "Chargeback", Timestamp::now())
            .unwrap();

        assert_eq!(p.status, PaymentStatus::Refunded);
        let refund = p.refund.unwrap();
        assert_eq!(refund.reason, "Chargeback");
        assert_eq!(refund.amount, p.amount);
    }

    #[test]
    fn pending_status_update_keeps_status() {
        let mut p = pending();
        p.record_pending_status(receipt(0), Timestamp::now());
        assert!(p.is_pending());
        assert_eq!(p.gateway.unwrap().status_code, 0);
    }
}
