//! PaymentRepository port - the payment ledger.
//!
//! Payments are keyed by their unique order id. The ledger is append and
//! transition only: rows are never deleted.
//!
//! ## Concurrency
//!
//! Gateway callbacks may be duplicated or reordered, so single-record status
//! changes go through [`PaymentRepository::update_if_status`], a
//! compare-and-swap on the current status. Multi-record changes (success and
//! chargeback) go through
//! [`MembershipTransitions`](super::MembershipTransitions).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::payment::{OrderId, Payment, PaymentStatus};

/// Result of saving a new payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Payment was newly inserted.
    Inserted,
    /// A payment with this order id already exists.
    AlreadyExists,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Inserts a new payment.
    ///
    /// Returns `AlreadyExists` instead of failing when the order id is taken.
    async fn save(&self, payment: &Payment) -> Result<SaveResult, DomainError>;

    /// Finds a payment by its order id.
    async fn find_by_order_id(&self, order_id: &OrderId) -> Result<Option<Payment>, DomainError>;

    /// Most recent pending payment of `user_id` created at or after `since`.
    async fn find_pending_for_user_since(
        &self,
        user_id: &UserId,
        since: Timestamp,
    ) -> Result<Option<Payment>, DomainError>;

    /// Pending payments created before `cutoff`, oldest first.
    async fn find_pending_created_before(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<Payment>, DomainError>;

    /// Writes `payment` only if the stored status is still `expected`.
    ///
    /// Returns `false` when another writer changed the status first.
    async fn update_if_status(
        &self,
        payment: &Payment,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError>;
}
