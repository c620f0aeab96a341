//! Membership fields embedded in a member record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PackageId, PaymentId, Timestamp};
use crate::domain::package::PlanCategory;

use super::MembershipStatus;

/// Membership state of one member.
///
/// Only the payment reconciler and the lifecycle sweeper change these fields.
/// Profile updates never touch them.
///
/// # Invariants
///
/// - `status == Active` implies `end_date` was in the future when it was set
/// - `grace_period_end_date = end_date + grace days` after every activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipState {
    pub status: MembershipStatus,
    pub package_id: Option<PackageId>,
    pub plan: Option<PlanCategory>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub grace_period_end_date: Option<Timestamp>,
    pub auto_renew: bool,
    pub last_payment_at: Option<Timestamp>,
    /// Successful payments, oldest first.
    pub payment_ids: Vec<PaymentId>,
}

impl MembershipState {
    /// True if the member may enter the gym at `now`.
    ///
    /// Active members have access until their end date; members in the
    /// grace period keep access until the grace period ends.
    pub fn has_access(&self, now: Timestamp) -> bool {
        match self.status {
            MembershipStatus::Active => self.end_date.map_or(false, |end| end.is_after(&now)),
            MembershipStatus::GracePeriod => self
                .grace_period_end_date
                .map_or(false, |end| end.is_after(&now)),
            MembershipStatus::Inactive | MembershipStatus::Expired => false,
        }
    }

    /// True for an active membership whose end date is still ahead.
    pub fn is_currently_active(&self, now: Timestamp) -> bool {
        self.status == MembershipStatus::Active
            && self.end_date.map_or(false, |end| end.is_after(&now))
    }

    /// Whole days left on the membership, rounded up. Zero when not active.
    pub fn days_remaining(&self, now: Timestamp) -> u32 {
        if self.status != MembershipStatus::Active {
            return 0;
        }
        self.end_date.map_or(0, |end| now.days_until_ceil(&end))
    }

    /// Active membership whose end date lies before `today` (midnight).
    pub fn has_ended_before(&self, today: Timestamp) -> bool {
        self.status == MembershipStatus::Active && self.end_date.map_or(false, |end| end < today)
    }

    /// Grace period whose end date lies before `today` (midnight).
    pub fn grace_ended_before(&self, today: Timestamp) -> bool {
        self.status == MembershipStatus::GracePeriod
            && self.grace_period_end_date.map_or(false, |end| end < today)
    }

    /// Active membership ending within `[from, to)`.
    pub fn ends_within(&self, from: Timestamp, to: Timestamp) -> bool {
        self.status == MembershipStatus::Active
            && self.end_date.map_or(false, |end| from <= end && end < to)
    }

    /// Grace period ending within `[from, to)`.
    pub fn grace_ends_within(&self, from: Timestamp, to: Timestamp) -> bool {
        self.status == MembershipStatus::GracePeriod
            && self
                .grace_period_end_date
                .map_or(false, |end| from <= end && end < to)
    }

    /// Start of a newly paid term. A membership still running is extended
    /// from its current end date, anything else starts at `now`.
    pub fn next_term_start(&self, now: Timestamp) -> Timestamp {
        match self.end_date {
            Some(end) if self.is_currently_active(now) => end,
            _ => now,
        }
    }

    /// True when `payment_id` paid for the term currently on the membership.
    pub fn is_funded_by(&self, payment_id: &PaymentId) -> bool {
        self.payment_ids.last() == Some(payment_id)
    }

    /// Package whose slot this member currently holds.
    pub fn held_package(&self) -> Option<PackageId> {
        if self.status.holds_slot() {
            self.package_id
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn hours(h: i64) -> Duration {
        Duration::hours(h)
    }

    fn active_until(end: Timestamp) -> MembershipState {
        MembershipState {
            status: MembershipStatus::Active,
            package_id: Some(PackageId::new()),
            end_date: Some(end),
            grace_period_end_date: Some(end.add_days(5)),
            ..Default::default()
        }
    }

    #[test]
    fn default_state_is_inactive_without_access() {
        let state = MembershipState::default();
        assert_eq!(state.status, MembershipStatus::Inactive);
        assert!(!state.has_access(Timestamp::now()));
        assert_eq!(state.held_package(), None);
    }

    #[test]
    fn days_remaining_rounds_up() {
        let now = Timestamp::now();
        let state = active_until(now.add_days(10).minus(hours(3)));
        assert_eq!(state.days_remaining(now), 10);
    }

    #[test]
    fn days_remaining_is_zero_past_end() {
        let now = Timestamp::now();
        let state = active_until(now.add_days(-1));
        assert_eq!(state.days_remaining(now), 0);
        assert!(!state.is_currently_active(now));
    }

    #[test]
    fn grace_period_keeps_access_until_grace_end() {
        let now = Timestamp::now();
        let mut state = active_until(now.add_days(-2));
        state.status = MembershipStatus::GracePeriod;

        assert!(state.has_access(now));
        assert!(!state.has_access(now.add_days(4)));
        assert_eq!(state.days_remaining(now), 0);
        assert!(state.held_package().is_some());
    }

    #[test]
    fn sweep_predicates_use_day_boundaries() {
        let today = Timestamp::now().start_of_day();
        let yesterday_noon = today.add_days(-1).plus(hours(12));

        let ended = active_until(yesterday_noon);
        assert!(ended.has_ended_before(today));
        assert!(!active_until(today.add_days(1)).has_ended_before(today));

        let in_week = active_until(today.add_days(7).plus(hours(9)));
        assert!(in_week.ends_within(today.add_days(7), today.add_days(8)));
        assert!(!in_week.ends_within(today.add_days(3), today.add_days(4)));

        let mut grace = active_until(today.add_days(-5));
        grace.status = MembershipStatus::GracePeriod;
        grace.grace_period_end_date = Some(today.minus(hours(1)));
        assert!(grace.grace_ended_before(today));
        assert!(!grace.has_ended_before(today));

        grace.grace_period_end_date = Some(today.plus(hours(6)));
        assert!(grace.grace_ends_within(today, today.add_days(1)));
        assert!(!grace.grace_ended_before(today));
    }

    #[test]
    fn expired_member_holds_no_slot() {
        let now = Timestamp::now();
        let mut state = active_until(now.add_days(-10));
        state.status = MembershipStatus::Expired;
        assert_eq!(state.held_package(), None);
    }
}
