//! Background crawl scheduler.
//!
//! Registers one cron job per tier at server startup. Each firing sweeps the
//! tier's roster and spawns one crawl per creator. Run exactly one server
//! instance per database: the scheduler has no cross-process coordination, so
//! a second instance would double-dispatch every sweep.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use cwatch_core::Tier;
use cwatch_crawler::{dispatch_tier, CrawlExecutor};

/// Builds and starts the background job scheduler with one job per tier.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised or
/// started, or if a tier's cron expression fails to register.
pub async fn build_scheduler(
    pool: PgPool,
    executor: Arc<CrawlExecutor>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    for tier in Tier::ALL {
        let pool = pool.clone();
        let executor = Arc::clone(&executor);
        let job = Job::new_async(tier.cron_schedule(), move |_id, _lock| {
            let pool = pool.clone();
            let executor = Arc::clone(&executor);
            Box::pin(async move {
                tracing::info!(tier = %tier, "tier sweep starting");
                match dispatch_tier(&pool, &executor, tier).await {
                    Ok(dispatched) => {
                        tracing::info!(tier = %tier, dispatched, "tier sweep complete");
                    }
                    Err(err) => {
                        tracing::error!(tier = %tier, error = %err, "tier sweep failed");
                    }
                }
            })
        })?;
        scheduler.add(job).await?;
    }

    scheduler.start().await?;
    Ok(scheduler)
}
