//! Membership window: the dates a successful payment buys.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Fixed grace window after a membership ends, in days.
pub const GRACE_PERIOD_DAYS: i64 = 5;

/// Start, end and grace-period end of one paid membership term.
///
/// # Invariants
///
/// - `start < end`
/// - `grace_period_end = end + grace days`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipWindow {
    pub start: Timestamp,
    pub end: Timestamp,
    pub grace_period_end: Timestamp,
}

impl MembershipWindow {
    /// Window starting at `start` and lasting `duration_months` calendar
    /// months, followed by `grace_days` of grace.
    pub fn starting(start: Timestamp, duration_months: u32, grace_days: i64) -> Self {
        let end = start.add_months(duration_months.max(1));
        Self {
            start,
            end,
            grace_period_end: end.add_days(grace_days),
        }
    }

    /// Window with the standard five-day grace period.
    pub fn standard(start: Timestamp, duration_months: u32) -> Self {
        Self::starting(start, duration_months, GRACE_PERIOD_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Utc};

    #[test]
    fn grace_period_ends_five_days_after_end() {
        let start = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let window = MembershipWindow::standard(start, 3);

        assert_eq!(window.end.as_datetime().month(), 6);
        assert_eq!(window.end.as_datetime().day(), 1);
        assert_eq!(window.grace_period_end, window.end.add_days(5));
    }

    #[test]
    fn zero_duration_is_treated_as_one_month() {
        let start = Timestamp::now();
        let window = MembershipWindow::starting(start, 0, 5);
        assert!(window.end.is_after(&start));
    }
}
