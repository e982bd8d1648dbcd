//! Background job scheduler.
//!
//! Runs daily cache cleanup against whichever [`ContentCache`] the server
//! was started with.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use wayfind_core::ContentCache;

/// Every day at 03:30 UTC.
const CLEANUP_SCHEDULE: &str = "0 30 3 * * *";

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    cache: Arc<dyn ContentCache>,
    cleanup_days: u32,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_cleanup_job(&scheduler, cache, cleanup_days).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_cleanup_job(
    scheduler: &JobScheduler,
    cache: Arc<dyn ContentCache>,
    cleanup_days: u32,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(CLEANUP_SCHEDULE, move |_uuid, _lock| {
        let cache = Arc::clone(&cache);
        Box::pin(async move {
            run_cleanup(cache.as_ref(), cleanup_days).await;
        })
    })?;
    scheduler.add(job).await?;
    Ok(())
}

/// One cleanup pass. Failures are logged; the next scheduled run retries.
pub(crate) async fn run_cleanup(cache: &dyn ContentCache, cleanup_days: u32) -> Option<u64> {
    tracing::info!(older_than_days = cleanup_days, "scheduler: starting cache cleanup");
    match cache.cleanup(cleanup_days).await {
        Ok(removed) => {
            tracing::info!(removed, "scheduler: cache cleanup complete");
            Some(removed)
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: cache cleanup failed");
            None
        }
    }
}
