//! PostgreSQL implementation of MembershipTransitions.
//!
//! Each operation runs in one transaction. Rows are locked in a fixed order
//! (payment, member, package) so concurrent callbacks and sweeps cannot
//! deadlock each other. Returning early drops the transaction, which rolls
//! it back.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::membership::{charge_back, settle_payment, Member, MembershipStatus};
use crate::domain::payment::PaymentStatus;
use crate::ports::{
    Activation, ActivationOutcome, ActivationRequest, Chargeback, ChargebackOutcome,
    ChargebackRequest, MembershipTransitions, Suspension,
};

use super::rows::{
    append_payment_history, db_error, lock_member, lock_package, lock_payment, release_slot,
    write_locked_payment, write_member_count, write_membership,
};

pub struct PostgresMembershipTransitions {
    pool: PgPool,
}

impl PostgresMembershipTransitions {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn not_found(code: ErrorCode, what: &str, id: impl std::fmt::Display) -> DomainError {
    DomainError::new(code, format!("{} not found: {}", what, id))
}

#[async_trait]
impl MembershipTransitions for PostgresMembershipTransitions {
    async fn activate(&self, request: ActivationRequest) -> Result<ActivationOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let mut payment = lock_payment(&mut tx, &request.order_id)
            .await?
            .ok_or_else(|| not_found(ErrorCode::PaymentNotFound, "Payment", &request.order_id))?;
        let previous = payment.status;
        match previous {
            PaymentStatus::Success => return Ok(ActivationOutcome::AlreadySettled),
            _ if payment.awaits_settlement() => {}
            other => return Ok(ActivationOutcome::NotPending(other)),
        }

        let mut member = lock_member(&mut tx, &payment.user_id)
            .await?
            .ok_or_else(|| not_found(ErrorCode::MemberNotFound, "Member", payment.user_id))?;
        let mut package = lock_package(&mut tx, &payment.package_id)
            .await?
            .ok_or_else(|| not_found(ErrorCode::PackageNotFound, "Package", payment.package_id))?;

        let settlement = settle_payment(
            &mut payment,
            &mut member,
            &package,
            request.receipt,
            request.now,
            request.grace_days,
        )?;

        let released = settlement.slots.release;
        if released == Some(package.id) {
            package.release_slot();
        }
        let slot = package.claim_slot();

        write_locked_payment(&mut tx, &payment, previous).await?;
        write_membership(&mut tx, &member).await?;
        append_payment_history(&mut tx, &member, &payment).await?;
        if let Some(old) = released.filter(|old| *old != package.id) {
            release_slot(&mut tx, &old).await?;
        }
        write_member_count(&mut tx, &package).await?;

        tx.commit().await.map_err(db_error("commit activation"))?;

        Ok(ActivationOutcome::Activated(Box::new(Activation {
            payment,
            member,
            package,
            slot,
            released,
        })))
    }

    async fn charge_back(
        &self,
        request: ChargebackRequest,
    ) -> Result<ChargebackOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let mut payment = lock_payment(&mut tx, &request.order_id)
            .await?
            .ok_or_else(|| not_found(ErrorCode::PaymentNotFound, "Payment", &request.order_id))?;
        let previous = payment.status;
        match previous {
            PaymentStatus::Pending | PaymentStatus::Success => {}
            PaymentStatus::Refunded => return Ok(ChargebackOutcome::AlreadyRefunded),
            other => return Ok(ChargebackOutcome::NotApplicable(other)),
        }

        let mut member = lock_member(&mut tx, &payment.user_id).await?;
        let released = charge_back(
            &mut payment,
            member.as_mut(),
            request.receipt,
            request.amount,
            request.now,
        )?;

        write_locked_payment(&mut tx, &payment, previous).await?;
        let revoked = match (released, member) {
            (Some(package_id), Some(member)) => {
                write_membership(&mut tx, &member).await?;
                release_slot(&mut tx, &package_id).await?;
                Some(member)
            }
            _ => None,
        };

        tx.commit().await.map_err(db_error("commit chargeback"))?;

        Ok(ChargebackOutcome::Applied(Box::new(Chargeback {
            payment,
            revoked,
            released,
        })))
    }

    async fn enter_grace_period(
        &self,
        user_id: &UserId,
        today: Timestamp,
        now: Timestamp,
    ) -> Result<Option<Member>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let mut member = lock_member(&mut tx, user_id)
            .await?
            .ok_or_else(|| not_found(ErrorCode::MemberNotFound, "Member", user_id))?;
        if member.status() != MembershipStatus::Active || !member.membership.has_ended_before(today)
        {
            return Ok(None);
        }
        member.enter_grace_period(now)?;
        write_membership(&mut tx, &member).await?;

        tx.commit().await.map_err(db_error("commit grace period"))?;
        Ok(Some(member))
    }

    async fn suspend_expired(
        &self,
        user_id: &UserId,
        today: Timestamp,
        now: Timestamp,
    ) -> Result<Option<Suspension>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let mut member = lock_member(&mut tx, user_id)
            .await?
            .ok_or_else(|| not_found(ErrorCode::MemberNotFound, "Member", user_id))?;
        if member.status() != MembershipStatus::GracePeriod
            || !member.membership.grace_ended_before(today)
        {
            return Ok(None);
        }
        let released = member.expire_membership(now)?;
        write_membership(&mut tx, &member).await?;
        if let Some(package_id) = released {
            release_slot(&mut tx, &package_id).await?;
        }

        tx.commit().await.map_err(db_error("commit suspension"))?;
        Ok(Some(Suspension { member, released }))
    }
}
