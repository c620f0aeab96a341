//! Membership lifecycle configuration

use std::str::FromStr;

use serde::Deserialize;

use crate::domain::membership::{DEFAULT_REMINDER_DAYS, GRACE_PERIOD_DAYS};

use super::error::ValidationError;

/// Grace period, reminder lead times and sweep schedule
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Days of access after a membership ends
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: i64,

    /// Reminder lead times in days, comma-separated in the environment
    #[serde(default = "default_reminder_days")]
    pub reminder_days: String,

    /// Six-field cron expression (with seconds) for the daily sweep, UTC
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
}

impl LifecycleConfig {
    /// Parsed reminder lead times.
    pub fn reminder_days_list(&self) -> Result<Vec<u32>, ValidationError> {
        self.reminder_days
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| u32::from_str(s).map_err(|_| ValidationError::InvalidReminderDays))
            .collect()
    }

    /// Validate lifecycle configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0..=60).contains(&self.grace_period_days) {
            return Err(ValidationError::InvalidGracePeriod);
        }
        let days = self.reminder_days_list()?;
        if days.iter().any(|d| *d == 0 || *d > 60) {
            return Err(ValidationError::InvalidReminderDays);
        }
        if self.sweep_cron.split_whitespace().count() != 6 {
            return Err(ValidationError::InvalidCron(self.sweep_cron.clone()));
        }
        Ok(())
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            grace_period_days: default_grace_period_days(),
            reminder_days: default_reminder_days(),
            sweep_cron: default_sweep_cron(),
        }
    }
}

fn default_grace_period_days() -> i64 {
    GRACE_PERIOD_DAYS
}

fn default_reminder_days() -> String {
    DEFAULT_REMINDER_DAYS
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn default_sweep_cron() -> String {
    "0 0 8 * * *".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LifecycleConfig::default();
        assert_eq!(config.grace_period_days, 5);
        assert_eq!(config.reminder_days_list().unwrap(), vec![7, 3, 1]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reminder_days_parsing_tolerates_spaces() {
        let config = LifecycleConfig {
            reminder_days: " 14, 2 ,".to_string(),
            ..Default::default()
        };
        assert_eq!(config.reminder_days_list().unwrap(), vec![14, 2]);
    }

    #[test]
    fn test_zero_reminder_day_rejected() {
        let config = LifecycleConfig {
            reminder_days: "7,0".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_five_field_cron_rejected() {
        let config = LifecycleConfig {
            sweep_cron: "0 8 * * *".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidCron(_))));
    }

    #[test]
    fn test_negative_grace_rejected() {
        let config = LifecycleConfig {
            grace_period_days: -1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
