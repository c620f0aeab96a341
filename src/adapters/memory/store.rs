//! In-memory store for tests and local runs.
//!
//! One async mutex guards all records, so every operation (including the
//! multi-record membership transitions) runs as a single transaction.
//! Transitions work on copies and write them back only after every step
//! succeeded, which gives the same all-or-nothing behaviour as a database
//! rollback.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, PackageId, Timestamp, UserId};
use crate::domain::membership::{
    charge_back, settle_payment, Member, MemberProfile, MembershipStatus,
    NotificationPreferences,
};
use crate::domain::package::Package;
use crate::domain::payment::{OrderId, Payment, PaymentStatus};
use crate::ports::{
    Activation, ActivationOutcome, ActivationRequest, Chargeback, ChargebackOutcome,
    ChargebackRequest, MemberRepository, MembershipTransitions, PackageRepository,
    PaymentRepository, SaveResult, Suspension,
};

#[derive(Default)]
struct State {
    packages: HashMap<PackageId, Package>,
    members: HashMap<UserId, Member>,
    payments: HashMap<OrderId, Payment>,
    fail_next_transaction: bool,
    failing_members: HashSet<UserId>,
}

impl State {
    /// Commit point of a transition. Injected failures abort here, before
    /// anything is written.
    fn commit_check(&mut self, user_id: &UserId) -> Result<(), DomainError> {
        if self.failing_members.contains(user_id) {
            return Err(DomainError::database(format!(
                "Simulated storage failure for member {}",
                user_id
            )));
        }
        if self.fail_next_transaction {
            self.fail_next_transaction = false;
            return Err(DomainError::database("Simulated transaction failure"));
        }
        Ok(())
    }

    fn payment(&self, order_id: &OrderId) -> Result<Payment, DomainError> {
        self.payments.get(order_id).cloned().ok_or_else(|| {
            DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment not found: {}", order_id),
            )
        })
    }

    fn member(&self, id: &UserId) -> Result<Member, DomainError> {
        self.members.get(id).cloned().ok_or_else(|| {
            DomainError::new(ErrorCode::MemberNotFound, format!("Member not found: {}", id))
        })
    }

    fn package(&self, id: &PackageId) -> Result<Package, DomainError> {
        self.packages.get(id).cloned().ok_or_else(|| {
            DomainError::new(ErrorCode::PackageNotFound, format!("Package not found: {}", id))
        })
    }

    fn release(&mut self, package_id: &PackageId) {
        if let Some(package) = self.packages.get_mut(package_id) {
            package.release_slot();
        }
    }
}

/// In-memory implementation of every persistence port.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Seeding and inspection ===

    pub async fn put_package(&self, package: Package) {
        self.state.lock().await.packages.insert(package.id, package);
    }

    pub async fn put_member(&self, member: Member) {
        self.state.lock().await.members.insert(member.id, member);
    }

    pub async fn put_payment(&self, payment: Payment) {
        self.state
            .lock()
            .await
            .payments
            .insert(payment.order_id.clone(), payment);
    }

    pub async fn package(&self, id: &PackageId) -> Option<Package> {
        self.state.lock().await.packages.get(id).cloned()
    }

    pub async fn member(&self, id: &UserId) -> Option<Member> {
        self.state.lock().await.members.get(id).cloned()
    }

    pub async fn payment(&self, order_id: &OrderId) -> Option<Payment> {
        self.state.lock().await.payments.get(order_id).cloned()
    }

    pub async fn payment_count(&self) -> usize {
        self.state.lock().await.payments.len()
    }

    // === Failure injection ===

    /// Makes the next membership transition fail as a storage error.
    pub async fn fail_next_transaction(&self) {
        self.state.lock().await.fail_next_transaction = true;
    }

    /// Makes every membership transition for `user_id` fail.
    pub async fn fail_transitions_for(&self, user_id: UserId) {
        self.state.lock().await.failing_members.insert(user_id);
    }
}

#[async_trait]
impl PackageRepository for InMemoryStore {
    async fn save(&self, package: &Package) -> Result<(), DomainError> {
        self.put_package(package.clone()).await;
        Ok(())
    }

    async fn find_by_id(&self, id: &PackageId) -> Result<Option<Package>, DomainError> {
        Ok(self.package(id).await)
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn insert(&self, member: &Member) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        if state.members.contains_key(&member.id) {
            return Err(DomainError::validation("id", "Member already exists"));
        }
        state.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Member>, DomainError> {
        Ok(self.member(id).await)
    }

    async fn find_by_membership_status(
        &self,
        status: MembershipStatus,
    ) -> Result<Vec<Member>, DomainError> {
        let state = self.state.lock().await;
        let mut members: Vec<Member> = state
            .members
            .values()
            .filter(|m| m.membership.status == status)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        profile: &MemberProfile,
        preferences: &NotificationPreferences,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let member = state.members.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::MemberNotFound, format!("Member not found: {}", id))
        })?;
        member.update_profile(profile.clone(), preferences.clone(), Timestamp::now());
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn save(&self, payment: &Payment) -> Result<SaveResult, DomainError> {
        let mut state = self.state.lock().await;
        if state.payments.contains_key(&payment.order_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        state
            .payments
            .insert(payment.order_id.clone(), payment.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_order_id(&self, order_id: &OrderId) -> Result<Option<Payment>, DomainError> {
        Ok(self.payment(order_id).await)
    }

    async fn find_pending_for_user_since(
        &self,
        user_id: &UserId,
        since: Timestamp,
    ) -> Result<Option<Payment>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .values()
            .filter(|p| p.user_id == *user_id && p.is_pending() && p.created_at >= since)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn find_pending_created_before(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<Payment>, DomainError> {
        let state = self.state.lock().await;
        let mut stale: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.is_pending() && p.created_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|p| p.created_at);
        Ok(stale)
    }

    async fn update_if_status(
        &self,
        payment: &Payment,
        expected: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.lock().await;
        match state.payments.get_mut(&payment.order_id) {
            Some(stored) if stored.status == expected => {
                *stored = payment.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment not found: {}", payment.order_id),
            )),
        }
    }
}

#[async_trait]
impl MembershipTransitions for InMemoryStore {
    async fn activate(&self, request: ActivationRequest) -> Result<ActivationOutcome, DomainError> {
        let mut state = self.state.lock().await;

        let mut payment = state.payment(&request.order_id)?;
        match payment.status {
            PaymentStatus::Success => return Ok(ActivationOutcome::AlreadySettled),
            _ if payment.awaits_settlement() => {}
            other => return Ok(ActivationOutcome::NotPending(other)),
        }
        let mut member = state.member(&payment.user_id)?;
        let mut package = state.package(&payment.package_id)?;

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

        state.commit_check(&member.id)?;
        if let Some(old) = released.filter(|old| *old != package.id) {
            state.release(&old);
        }
        state.packages.insert(package.id, package.clone());
        state.members.insert(member.id, member.clone());
        state
            .payments
            .insert(payment.order_id.clone(), payment.clone());

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
        let mut state = self.state.lock().await;

        let mut payment = state.payment(&request.order_id)?;
        match payment.status {
            PaymentStatus::Pending | PaymentStatus::Success => {}
            PaymentStatus::Refunded => return Ok(ChargebackOutcome::AlreadyRefunded),
            other => return Ok(ChargebackOutcome::NotApplicable(other)),
        }
        let mut member = state.members.get(&payment.user_id).cloned();

        let released = charge_back(
            &mut payment,
            member.as_mut(),
            request.receipt,
            request.amount,
            request.now,
        )?;

        state.commit_check(&payment.user_id)?;
        if let Some(package_id) = released {
            state.release(&package_id);
        }
        let revoked = match (released, member) {
            (Some(_), Some(member)) => {
                state.members.insert(member.id, member.clone());
                Some(member)
            }
            _ => None,
        };
        state
            .payments
            .insert(payment.order_id.clone(), payment.clone());

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
        let mut state = self.state.lock().await;

        let mut member = state.member(user_id)?;
        if member.status() != MembershipStatus::Active || !member.membership.has_ended_before(today)
        {
            return Ok(None);
        }
        member.enter_grace_period(now)?;

        state.commit_check(user_id)?;
        state.members.insert(member.id, member.clone());
        Ok(Some(member))
    }

    async fn suspend_expired(
        &self,
        user_id: &UserId,
        today: Timestamp,
        now: Timestamp,
    ) -> Result<Option<Suspension>, DomainError> {
        let mut state = self.state.lock().await;

        let mut member = state.member(user_id)?;
        if member.status() != MembershipStatus::GracePeriod
            || !member.membership.grace_ended_before(today)
        {
            return Ok(None);
        }
        let released = member.expire_membership(now)?;

        state.commit_check(user_id)?;
        if let Some(package_id) = released {
            state.release(&package_id);
        }
        state.members.insert(member.id, member.clone());
        Ok(Some(Suspension { member, released }))
    }
}
