//! RunLifecycleSweepHandler - the daily membership sweep.
//!
//! One sweep runs five ordered passes:
//!
//! 1. Grace period ending today: final warning, no state change
//! 2. Grace period ended before today: expire, release slot
//! 3. Active membership ended before today: move to grace period
//! 4. Reminders, one pass per lead time (default 7/3/1 days)
//!
//! Later passes read state written by earlier ones, so the order is fixed
//! here rather than left to wall-clock scheduling. A failure for one member
//! is logged and counted; the sweep continues with the rest.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::membership::{
    Member, MembershipStatus, NewNotification, NotificationPriority, NotificationType,
    DEFAULT_REMINDER_DAYS,
};
use crate::ports::{EmailTemplate, MemberRepository, MembershipTransitions};

use super::SideEffects;

/// Command to run one sweep.
#[derive(Debug, Clone, Copy)]
pub struct RunLifecycleSweepCommand {
    /// Instant the sweep runs at. Day boundaries are taken at UTC midnight.
    pub as_of: Timestamp,
}

impl RunLifecycleSweepCommand {
    pub fn now() -> Self {
        Self {
            as_of: Timestamp::now(),
        }
    }
}

/// Members processed per pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub grace_warnings: usize,
    pub suspended: usize,
    pub moved_to_grace: usize,
    /// Reminders sent, keyed by lead time in days.
    pub reminders: BTreeMap<u32, usize>,
    pub failures: usize,
}

impl SweepReport {
    pub fn total_reminders(&self) -> usize {
        self.reminders.values().sum()
    }
}

/// Handler for the daily lifecycle sweep.
pub struct RunLifecycleSweepHandler {
    members: Arc<dyn MemberRepository>,
    transitions: Arc<dyn MembershipTransitions>,
    effects: SideEffects,
    reminder_days: Vec<u32>,
}

impl RunLifecycleSweepHandler {
    pub fn new(
        members: Arc<dyn MemberRepository>,
        transitions: Arc<dyn MembershipTransitions>,
        effects: SideEffects,
    ) -> Self {
        Self {
            members,
            transitions,
            effects,
            reminder_days: DEFAULT_REMINDER_DAYS.to_vec(),
        }
    }

    /// Lead times for the reminder passes, run longest first.
    pub fn with_reminder_days(mut self, mut days: Vec<u32>) -> Self {
        days.sort_unstable_by(|a, b| b.cmp(a));
        days.dedup();
        self.reminder_days = days;
        self
    }

    pub async fn handle(&self, cmd: RunLifecycleSweepCommand) -> SweepReport {
        let now = cmd.as_of;
        let today = now.start_of_day();
        let mut report = SweepReport::default();

        tracing::info!(as_of = %now, "Lifecycle sweep started");

        self.warn_grace_ending(today, &mut report).await;
        self.suspend_expired(today, now, &mut report).await;
        self.move_ended_to_grace(today, now, &mut report).await;
        for days in self.reminder_days.clone() {
            self.send_reminders(today, days, &mut report).await;
        }

        tracing::info!(
            grace_warnings = report.grace_warnings,
            suspended = report.suspended,
            moved_to_grace = report.moved_to_grace,
            reminders = report.total_reminders(),
            failures = report.failures,
            "Lifecycle sweep finished"
        );
        report
    }

    async fn members_in(&self, status: MembershipStatus, report: &mut SweepReport) -> Vec<Member> {
        match self.members.find_by_membership_status(status).await {
            Ok(members) => members,
            Err(e) => {
                tracing::error!(error = %e, status = %status, "Failed to load members for sweep pass");
                report.failures += 1;
                Vec::new()
            }
        }
    }

    async fn warn_grace_ending(&self, today: Timestamp, report: &mut SweepReport) {
        let tomorrow = today.add_days(1);
        for member in self.members_in(MembershipStatus::GracePeriod, report).await {
            if !member.membership.grace_ends_within(today, tomorrow) {
                continue;
            }
            let grace_end = date_of(member.membership.grace_period_end_date);
            self.effects
                .notify(
                    NewNotification::new(
                        member.id,
                        NotificationType::GracePeriodEnding,
                        NotificationPriority::Urgent,
                        "Grace period ending",
                        format!(
                            "Your grace period ends on {}. Renew now to keep your access.",
                            grace_end
                        ),
                    )
                    .with_metadata("grace_period_end_date", grace_end.clone()),
                )
                .await;
            self.effects.email_member(
                &member,
                EmailTemplate::GracePeriodEnding,
                json!({ "name": member.profile.full_name(), "grace_period_end_date": grace_end }),
            );
            report.grace_warnings += 1;
        }
    }

    async fn suspend_expired(&self, today: Timestamp, now: Timestamp, report: &mut SweepReport) {
        for member in self.members_in(MembershipStatus::GracePeriod, report).await {
            if !member.membership.grace_ended_before(today) {
                continue;
            }
            let suspension = match self.transitions.suspend_expired(&member.id, today, now).await {
                Ok(Some(suspension)) => suspension,
                Ok(None) => continue,
                Err(e) => {
                    log_member_failure(&member, "suspend", &e);
                    report.failures += 1;
                    continue;
                }
            };

            let member = suspension.member;
            tracing::info!(
                user_id = %member.id,
                released_package = ?suspension.released,
                "Membership expired after grace period"
            );
            self.effects
                .notify(NewNotification::new(
                    member.id,
                    NotificationType::MembershipSuspended,
                    NotificationPriority::High,
                    "Membership expired",
                    "Your grace period has ended and your membership is now expired.",
                ))
                .await;
            self.effects.email_member(
                &member,
                EmailTemplate::MembershipSuspended,
                json!({ "name": member.profile.full_name() }),
            );
            report.suspended += 1;
        }
    }

    async fn move_ended_to_grace(
        &self,
        today: Timestamp,
        now: Timestamp,
        report: &mut SweepReport,
    ) {
        for member in self.members_in(MembershipStatus::Active, report).await {
            if !member.membership.has_ended_before(today) {
                continue;
            }
            let member = match self.transitions.enter_grace_period(&member.id, today, now).await {
                Ok(Some(updated)) => updated,
                Ok(None) => continue,
                Err(e) => {
                    log_member_failure(&member, "enter grace period", &e);
                    report.failures += 1;
                    continue;
                }
            };

            let grace_end = date_of(member.membership.grace_period_end_date);
            tracing::info!(user_id = %member.id, grace_period_end_date = %grace_end, "Membership entered grace period");
            self.effects
                .notify(
                    NewNotification::new(
                        member.id,
                        NotificationType::MembershipExpired,
                        NotificationPriority::High,
                        "Membership expired",
                        format!(
                            "Your membership has ended. You keep access until {} while in the grace period.",
                            grace_end
                        ),
                    )
                    .with_metadata("grace_period_end_date", grace_end.clone()),
                )
                .await;
            self.effects.email_member(
                &member,
                EmailTemplate::MembershipExpired,
                json!({ "name": member.profile.full_name(), "grace_period_end_date": grace_end }),
            );
            report.moved_to_grace += 1;
        }
    }

    async fn send_reminders(&self, today: Timestamp, days: u32, report: &mut SweepReport) {
        let from = today.add_days(i64::from(days));
        let to = from.add_days(1);
        let mut sent = 0;

        for member in self.members_in(MembershipStatus::Active, report).await {
            if !member.membership.ends_within(from, to) || !member.preferences.wants_reminder(days) {
                continue;
            }
            let end_date = date_of(member.membership.end_date);
            self.effects
                .notify(
                    NewNotification::new(
                        member.id,
                        NotificationType::MembershipReminder,
                        reminder_priority(days),
                        "Membership renewal reminder",
                        format!("Your membership ends in {} day(s), on {}.", days, end_date),
                    )
                    .with_metadata("days_remaining", days)
                    .with_metadata("end_date", end_date.clone()),
                )
                .await;
            self.effects.email_member(
                &member,
                EmailTemplate::MembershipReminder,
                json!({
                    "name": member.profile.full_name(),
                    "days_remaining": days,
                    "end_date": end_date,
                }),
            );
            sent += 1;
        }

        report.reminders.insert(days, sent);
    }
}

fn reminder_priority(days: u32) -> NotificationPriority {
    match days {
        0..=1 => NotificationPriority::Urgent,
        2..=3 => NotificationPriority::High,
        _ => NotificationPriority::Medium,
    }
}

fn date_of(ts: Option<Timestamp>) -> String {
    ts.map(|t| t.as_datetime().format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn log_member_failure(member: &Member, action: &str, err: &DomainError) {
    tracing::error!(
        error = %err,
        user_id = %member.id,
        action,
        "Sweep failed for member, continuing"
    );
}
