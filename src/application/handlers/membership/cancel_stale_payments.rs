//! CancelStalePaymentsHandler - cancels pending payments nobody completed.
//!
//! Disabled unless a maximum pending age is configured. Without it a pending
//! payment stays pending until the gateway reports an outcome.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::PaymentStatus;
use crate::ports::PaymentRepository;

#[derive(Debug, Clone, Copy)]
pub struct CancelStalePaymentsCommand {
    pub now: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelStalePaymentsResult {
    pub cancelled: usize,
    pub skipped: usize,
}

pub struct CancelStalePaymentsHandler {
    payments: Arc<dyn PaymentRepository>,
    max_age: Option<Duration>,
}

impl CancelStalePaymentsHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>, max_age: Option<Duration>) -> Self {
        Self { payments, max_age }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_age.is_some()
    }

    pub async fn handle(
        &self,
        cmd: CancelStalePaymentsCommand,
    ) -> Result<CancelStalePaymentsResult, DomainError> {
        let mut result = CancelStalePaymentsResult::default();
        let Some(max_age) = self.max_age else {
            return Ok(result);
        };

        let cutoff = cmd.now.minus(max_age);
        for mut payment in self.payments.find_pending_created_before(cutoff).await? {
            if let Err(e) = payment.mark_cancelled(None, cmd.now) {
                tracing::warn!(error = %e, order_id = %payment.order_id, "Stale payment not cancellable");
                result.skipped += 1;
                continue;
            }
            match self
                .payments
                .update_if_status(&payment, PaymentStatus::Pending)
                .await
            {
                Ok(true) => {
                    tracing::info!(
                        order_id = %payment.order_id,
                        created_at = %payment.created_at,
                        "Stale pending payment cancelled"
                    );
                    result.cancelled += 1;
                }
                Ok(false) => result.skipped += 1,
                Err(e) => {
                    tracing::error!(error = %e, order_id = %payment.order_id, "Failed to cancel stale payment");
                    result.skipped += 1;
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{Money, PackageId, UserId};
    use crate::domain::payment::{OrderId, Payment};

    async fn pending_created_at(store: &InMemoryStore, created_at: Timestamp) -> Payment {
        let user = UserId::new();
        let payment = Payment::initiate(
            user,
            PackageId::new(),
            OrderId::generate(&user, created_at),
            Money::from_major(100).unwrap(),
            "LKR",
            created_at,
        );
        store.put_payment(payment.clone()).await;
        payment
    }

    #[tokio::test]
    async fn disabled_without_max_age() {
        let store = Arc::new(InMemoryStore::new());
        let now = Timestamp::now();
        let old = pending_created_at(&store, now.add_days(-3)).await;

        let handler = CancelStalePaymentsHandler::new(store.clone(), None);
        let result = handler.handle(CancelStalePaymentsCommand { now }).await.unwrap();

        assert!(!handler.is_enabled());
        assert_eq!(result.cancelled, 0);
        assert!(store.payment(&old.order_id).await.unwrap().is_pending());
    }

    #[tokio::test]
    async fn cancels_only_payments_older_than_max_age() {
        let store = Arc::new(InMemoryStore::new());
        let now = Timestamp::now();
        let old = pending_created_at(&store, now.minus(Duration::hours(2))).await;
        let fresh = pending_created_at(&store, now.minus(Duration::minutes(10))).await;

        let handler = CancelStalePaymentsHandler::new(store.clone(), Some(Duration::hours(1)));
        let result = handler.handle(CancelStalePaymentsCommand { now }).await.unwrap();

        assert_eq!(result.cancelled, 1);
        assert_eq!(
            store.payment(&old.order_id).await.unwrap().status,
            PaymentStatus::Cancelled
        );
        assert!(store.payment(&fresh.order_id).await.unwrap().is_pending());
    }
}
