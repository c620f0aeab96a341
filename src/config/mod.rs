//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `GYM_MEMBERSHIP` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use gym_membership::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod email;
mod error;
mod lifecycle;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use lifecycle::LifecycleConfig;
pub use payment::PaymentConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Environment and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment gateway merchant account
    pub payment: PaymentConfig,

    /// Email configuration (Resend)
    #[serde(default)]
    pub email: EmailConfig,

    /// Grace period, reminders and sweep schedule
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `GYM_MEMBERSHIP` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `GYM_MEMBERSHIP__DATABASE__URL=...` -> `database.url = ...`
    /// - `GYM_MEMBERSHIP__PAYMENT__MERCHANT_ID=...` -> `payment.merchant_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GYM_MEMBERSHIP")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate(&self.server.environment)?;
        self.email.validate()?;
        self.lifecycle.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; tests touching them run one at a time.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "GYM_MEMBERSHIP__DATABASE__URL",
        "GYM_MEMBERSHIP__PAYMENT__MERCHANT_ID",
        "GYM_MEMBERSHIP__PAYMENT__MERCHANT_SECRET",
        "GYM_MEMBERSHIP__PAYMENT__RETURN_URL",
        "GYM_MEMBERSHIP__PAYMENT__CANCEL_URL",
        "GYM_MEMBERSHIP__PAYMENT__NOTIFY_URL",
        "GYM_MEMBERSHIP__PAYMENT__STALE_PENDING_CANCEL_AFTER_MINUTES",
        "GYM_MEMBERSHIP__SERVER__ENVIRONMENT",
        "GYM_MEMBERSHIP__LIFECYCLE__REMINDER_DAYS",
    ];

    fn set_minimal_env() {
        env::set_var("GYM_MEMBERSHIP__DATABASE__URL", "postgresql://gym@localhost/gym");
        env::set_var("GYM_MEMBERSHIP__PAYMENT__MERCHANT_ID", "1211149");
        env::set_var("GYM_MEMBERSHIP__PAYMENT__MERCHANT_SECRET", "merchant-secret");
        env::set_var("GYM_MEMBERSHIP__PAYMENT__RETURN_URL", "https://gym.example.com/return");
        env::set_var("GYM_MEMBERSHIP__PAYMENT__CANCEL_URL", "https://gym.example.com/cancel");
        env::set_var("GYM_MEMBERSHIP__PAYMENT__NOTIFY_URL", "https://api.gym.example.com/notify");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://gym@localhost/gym");
        assert_eq!(config.payment.merchant_id, "1211149");
        assert_eq!(config.payment.currency, "LKR");
        assert_eq!(config.lifecycle.grace_period_days, 5);
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
        assert!(config.payment.stale_pending_max_age().is_none());
    }

    #[test]
    fn test_optional_settings_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("GYM_MEMBERSHIP__PAYMENT__STALE_PENDING_CANCEL_AFTER_MINUTES", "120");
        env::set_var("GYM_MEMBERSHIP__LIFECYCLE__REMINDER_DAYS", "10,5");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.payment.stale_pending_cancel_after_minutes, Some(120));
        assert_eq!(config.lifecycle.reminder_days_list().unwrap(), vec![10, 5]);
    }

    #[test]
    fn test_production_rejects_sandbox_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("GYM_MEMBERSHIP__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::SandboxInProduction)
        ));
    }

    #[test]
    fn test_missing_payment_section_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("GYM_MEMBERSHIP__DATABASE__URL", "postgresql://gym@localhost/gym");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
