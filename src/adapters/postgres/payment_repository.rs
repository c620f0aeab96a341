//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::payment::{OrderId, Payment, PaymentStatus};
use crate::ports::{PaymentRepository, SaveResult};

use super::rows::{db_error, write_payment_if_status, PaymentRow, PAYMENT_COLUMNS};

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, package_id, order_id, amount_cents, currency, status,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (order_id) DO NOTHING
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.package_id.as_uuid())
        .bind(payment.order_id.as_str())
        .bind(payment.amount.cents())
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("save payment"))?;

        if result.rows_affected() == 0 {
            tracing::warn!(order_id = %payment.order_id, "Order id already recorded");
            return Ok(SaveResult::AlreadyExists);
        }
        Ok(SaveResult::Inserted)
    }

    async fn find_by_order_id(&self, order_id: &OrderId) -> Result<Option<Payment>, DomainError> {
        let sql = format!("SELECT {} FROM payments WHERE order_id = $1", PAYMENT_COLUMNS);
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(order_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find payment"))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_pending_for_user_since(
        &self,
        user_id: &UserId,
        since: Timestamp,
    ) -> Result<Option<Payment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM payments \
             WHERE user_id = $1 AND status = 'pending' AND created_at >= $2 \
             ORDER BY created_at DESC LIMIT 1",
            PAYMENT_COLUMNS
        );
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(user_id.as_uuid())
            .bind(since.as_datetime())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find pending payment"))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_pending_created_before(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<Payment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM payments WHERE status = 'pending' AND created_at < $1 \
             ORDER BY created_at",
            PAYMENT_COLUMNS
        );
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(cutoff.as_datetime())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("find stale payments"))?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn update_if_status(
        &self,
        payment: &Payment,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("acquire connection"))?;
        write_payment_if_status(&mut *conn, payment, expected).await
    }
}
