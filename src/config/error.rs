//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid log format (expected 'pretty' or 'json')")]
    InvalidLogFormat,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid URL for {0}")]
    InvalidUrl(&'static str),

    #[error("Gateway URLs must use HTTPS in production")]
    GatewayUrlMustBeHttps,

    #[error("Sandbox checkout is not allowed in production")]
    SandboxInProduction,

    #[error("Duplicate payment window must be at least one minute")]
    InvalidDuplicateWindow,

    #[error("Stale payment age must be at least one minute")]
    InvalidStaleAge,

    #[error("Invalid Resend API key format")]
    InvalidResendKey,

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Grace period must be between 0 and 60 days")]
    InvalidGracePeriod,

    #[error("Reminder lead times must be between 1 and 60 days")]
    InvalidReminderDays,

    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),
}
