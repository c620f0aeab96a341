//! MembershipTransitions port - atomic multi-record membership changes.
//!
//! Every operation here touches more than one record (payment, member,
//! package capacity) and must apply all of its writes or none of them.
//!
//! ## Serialization
//!
//! Implementations lock the payment row by order id (or hold an equivalent
//! exclusive lock) before reading its status, so two deliveries of the same
//! callback cannot both observe `pending`. Sweep transitions re-check the
//! member's state under the lock, so a sweep racing a renewal never expires a
//! freshly renewed member.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, PackageId, Timestamp, UserId};
use crate::domain::membership::Member;
use crate::domain::package::{Package, SlotClaim};
use crate::domain::payment::{GatewayReceipt, OrderId, Payment, PaymentStatus};

/// Input for settling a successful payment.
#[derive(Debug, Clone)]
pub struct ActivationRequest {
    pub order_id: OrderId,
    pub receipt: GatewayReceipt,
    pub now: Timestamp,
    pub grace_days: i64,
}

/// Records written by a settlement.
#[derive(Debug, Clone)]
pub struct Activation {
    pub payment: Payment,
    pub member: Member,
    pub package: Package,
    pub slot: SlotClaim,
    /// Slot released because the member renewed onto this package.
    pub released: Option<PackageId>,
}

#[derive(Debug, Clone)]
pub enum ActivationOutcome {
    Activated(Box<Activation>),
    /// Payment was already successful. Nothing written.
    AlreadySettled,
    /// Payment had already reached an outcome the gateway reported. Nothing
    /// written.
    NotPending(PaymentStatus),
}

/// Input for applying a chargeback.
#[derive(Debug, Clone)]
pub struct ChargebackRequest {
    pub order_id: OrderId,
    pub receipt: GatewayReceipt,
    pub amount: Money,
    pub now: Timestamp,
}

/// Records written by a chargeback.
#[derive(Debug, Clone)]
pub struct Chargeback {
    pub payment: Payment,
    /// Member whose active membership was revoked.
    pub revoked: Option<Member>,
    pub released: Option<PackageId>,
}

#[derive(Debug, Clone)]
pub enum ChargebackOutcome {
    Applied(Box<Chargeback>),
    /// Payment was already refunded. Nothing written.
    AlreadyRefunded,
    /// Payment failed or was cancelled; there is nothing to reverse.
    NotApplicable(PaymentStatus),
}

/// Records written when a grace period ends.
#[derive(Debug, Clone)]
pub struct Suspension {
    pub member: Member,
    pub released: Option<PackageId>,
}

#[async_trait]
pub trait MembershipTransitions: Send + Sync {
    /// Settles a pending payment, or one cancelled by stale cleanup: payment
    /// success, member activation and capacity claim in one transaction.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` for an unknown order id
    /// - `MemberNotFound` / `PackageNotFound` for dangling references
    /// - `DatabaseError` on persistence failure (nothing committed)
    async fn activate(&self, request: ActivationRequest) -> Result<ActivationOutcome, DomainError>;

    /// Refunds a payment and revokes the member's active membership,
    /// releasing its slot.
    async fn charge_back(&self, request: ChargebackRequest)
        -> Result<ChargebackOutcome, DomainError>;

    /// Moves an active member whose end date is before `today` into the
    /// grace period. Returns `None` if the member no longer qualifies.
    async fn enter_grace_period(
        &self,
        user_id: &UserId,
        today: Timestamp,
        now: Timestamp,
    ) -> Result<Option<Member>, DomainError>;

    /// Expires a member whose grace period ended before `today` and releases
    /// the held slot. Returns `None` if the member no longer qualifies.
    async fn suspend_expired(
        &self,
        user_id: &UserId,
        today: Timestamp,
        now: Timestamp,
    ) -> Result<Option<Suspension>, DomainError>;
}
