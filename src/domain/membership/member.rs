//! Member aggregate.
//!
//! A member carries profile data, notification preferences and the embedded
//! [`MembershipState`]. Profile edits and membership transitions go through
//! separate methods so that a profile update can never move status or dates.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, PackageId, PaymentId, StateMachine, Timestamp, UserId,
};
use crate::domain::package::Package;

use super::{MembershipState, MembershipStatus, MembershipWindow};

/// Default reminder lead times, in days before the membership end date.
pub const DEFAULT_REMINDER_DAYS: [u32; 3] = [7, 3, 1];

/// Contact and buyer-identity data of a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl MemberProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Which communications a member opted into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email_enabled: bool,
    /// Lead times (days before end date) for renewal reminders.
    pub reminder_days: Vec<u32>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_enabled: true,
            reminder_days: DEFAULT_REMINDER_DAYS.to_vec(),
        }
    }
}

impl NotificationPreferences {
    pub fn wants_reminder(&self, days_before: u32) -> bool {
        self.reminder_days.contains(&days_before)
    }
}

/// Capacity effect of an activation: the slot to claim and the slot (if
/// any) the member held before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotChange {
    pub claim: PackageId,
    pub release: Option<PackageId>,
}

/// A gym member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
    pub profile: MemberProfile,
    pub preferences: NotificationPreferences,
    pub membership: MembershipState,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Member {
    /// Creates an inactive member.
    pub fn new(id: UserId, profile: MemberProfile) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            profile,
            preferences: NotificationPreferences::default(),
            membership: MembershipState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> MembershipStatus {
        self.membership.status
    }

    /// Activates (or renews) the membership bought by `payment_id`.
    ///
    /// A membership still running keeps its start date and takes the end
    /// dates of `window`, which the caller starts at the current end date.
    ///
    /// Returns the capacity change the caller must apply in the same
    /// transaction.
    pub fn activate_membership(
        &mut self,
        package: &Package,
        payment_id: PaymentId,
        window: MembershipWindow,
        now: Timestamp,
    ) -> Result<SlotChange, DomainError> {
        let release = self.membership.held_package();
        let extending = self.membership.is_currently_active(now);
        self.transition_to(MembershipStatus::Active)?;

        let state = &mut self.membership;
        state.package_id = Some(package.id);
        state.plan = Some(package.plan_category());
        if !extending || state.start_date.is_none() {
            state.start_date = Some(window.start);
        }
        state.end_date = Some(window.end);
        state.grace_period_end_date = Some(window.grace_period_end);
        state.last_payment_at = Some(now);
        if !state.payment_ids.contains(&payment_id) {
            state.payment_ids.push(payment_id);
        }
        self.updated_at = now;

        Ok(SlotChange {
            claim: package.id,
            release,
        })
    }

    /// Reverts an active membership after a chargeback.
    ///
    /// Returns the package whose slot must be released, or `None` when the
    /// membership was not active and nothing changed.
    pub fn revoke_membership(&mut self, now: Timestamp) -> Result<Option<PackageId>, DomainError> {
        if self.membership.status != MembershipStatus::Active {
            return Ok(None);
        }
        let released = self.membership.held_package();
        self.transition_to(MembershipStatus::Expired)?;
        self.updated_at = now;
        Ok(released)
    }

    /// Moves an ended active membership into the grace period.
    pub fn enter_grace_period(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(MembershipStatus::GracePeriod)?;
        self.updated_at = now;
        Ok(())
    }

    /// Expires a membership whose grace period is over.
    ///
    /// Returns the package whose slot must be released.
    pub fn expire_membership(&mut self, now: Timestamp) -> Result<Option<PackageId>, DomainError> {
        let released = self.membership.held_package();
        if self.membership.status != MembershipStatus::GracePeriod {
            return Err(DomainError::invalid_transition(
                self.membership.status,
                MembershipStatus::Expired,
            ));
        }
        self.transition_to(MembershipStatus::Expired)?;
        self.updated_at = now;
        Ok(released)
    }

    /// Replaces profile data and preferences. Membership fields are untouched.
    pub fn update_profile(
        &mut self,
        profile: MemberProfile,
        preferences: NotificationPreferences,
        now: Timestamp,
    ) {
        self.profile = profile;
        self.preferences = preferences;
        self.updated_at = now;
    }

    fn transition_to(&mut self, target: MembershipStatus) -> Result<(), DomainError> {
        let current = self.membership.status;
        self.membership.status = current
            .transition_to(target)
            .map_err(|_| {
                DomainError::invalid_transition(current, target)
                    .with_detail("user_id", self.id.to_string())
            })?;
        Ok(())
    }
}
