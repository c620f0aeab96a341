//! Membership lifecycle worker.
//!
//! Loads configuration, connects to PostgreSQL, runs migrations and drives
//! the daily lifecycle sweep until interrupted. Payment initiation and
//! gateway callbacks are served by the HTTP layer that embeds this crate.

use std::error::Error;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gym_membership::adapters::scheduler::start_lifecycle_scheduler;
use gym_membership::bootstrap::{CorePorts, MembershipCore};
use gym_membership::config::{AppConfig, LogFormat, ServerConfig};

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(server.log_level.clone()));

    match server.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    tracing::info!(environment = ?config.server.environment, "Starting membership worker");

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let core = MembershipCore::build(CorePorts::postgres(pool.clone(), &config.email), &config)?;

    let mut scheduler = start_lifecycle_scheduler(
        &config.lifecycle.sweep_cron,
        core.lifecycle_sweep.clone(),
        core.cancel_stale_payments.clone(),
    )
    .await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    scheduler.shutdown().await?;
    pool.close().await;
    Ok(())
}
