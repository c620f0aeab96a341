//! Lifecycle scheduler.

use std::sync::Arc;

use thiserror::Error;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::application::{
    CancelStalePaymentsCommand, CancelStalePaymentsHandler, RunLifecycleSweepCommand,
    RunLifecycleSweepHandler,
};
use crate::domain::foundation::Timestamp;

/// Stale pending payments are checked at the top of every hour.
pub const STALE_PAYMENT_CRON: &str = "0 0 * * * *";

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// Starts the lifecycle jobs and returns the running scheduler.
///
/// `sweep_cron` uses the six-field format with seconds
/// (`0 0 8 * * *` = 08:00:00 UTC daily). The stale payment job is only
/// registered when the handler is enabled.
pub async fn start_lifecycle_scheduler(
    sweep_cron: &str,
    sweep: Arc<RunLifecycleSweepHandler>,
    stale: Arc<CancelStalePaymentsHandler>,
) -> Result<JobScheduler, SchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let stale_enabled = stale.is_enabled();

    let sweep_job = Job::new_async(sweep_cron, move |_uuid, _lock| {
        let sweep = sweep.clone();
        Box::pin(async move {
            let report = sweep.handle(RunLifecycleSweepCommand::now()).await;
            if report.failures > 0 {
                tracing::warn!(failures = report.failures, "Lifecycle sweep finished with failures");
            }
        })
    })?;
    scheduler.add(sweep_job).await?;

    if stale_enabled {
        let stale_job = Job::new_async(STALE_PAYMENT_CRON, move |_uuid, _lock| {
            let stale = stale.clone();
            Box::pin(async move {
                let cmd = CancelStalePaymentsCommand {
                    now: Timestamp::now(),
                };
                match stale.handle(cmd).await {
                    Ok(result) if result.cancelled > 0 => {
                        tracing::info!(
                            cancelled = result.cancelled,
                            skipped = result.skipped,
                            "Stale pending payments cancelled"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Stale payment cancellation failed"),
                }
            })
        })?;
        scheduler.add(stale_job).await?;
    }

    scheduler.start().await?;
    tracing::info!(
        sweep_cron = %sweep_cron,
        stale_cancellation = stale_enabled,
        "Lifecycle scheduler started"
    );

    Ok(scheduler)
}
