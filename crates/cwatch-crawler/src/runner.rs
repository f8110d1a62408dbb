//! Drives one crawl run from `queued` to a terminal status.
//!
//! The run row is operator bookkeeping: its own failures are logged, never
//! allowed to mask the crawl outcome.

use std::sync::Arc;

use sqlx::PgPool;

use cwatch_db::{
    complete_crawl_run, fail_crawl_run, record_crawl_attempt, start_crawl_run, CrawlRunRow,
    DbError,
};

use crate::error::CrawlError;
use crate::executor::{CrawlExecutor, CrawlRequest, CrawlSummary};
use crate::retry::retry_with_backoff;

/// Executes the crawl a run row describes, retrying transient failures, and
/// moves the row to `succeeded` or `failed`.
///
/// The `queued -> running` transition goes through the same retry policy as
/// the crawl itself; if it still fails, the row is marked `failed` so no run
/// lingers in `queued` — unless the transition was rejected because another
/// driver already owns the row, in which case it is left alone.
///
/// # Errors
///
/// The terminal [`CrawlError`] when all attempts fail; the run row is marked
/// `failed` first.
pub async fn run_crawl(
    pool: &PgPool,
    executor: &CrawlExecutor,
    run: &CrawlRunRow,
) -> Result<CrawlSummary, CrawlError> {
    let started = retry_with_backoff(
        executor.max_retries(),
        executor.backoff_base_ms(),
        || async { start_crawl_run(pool, run.id).await.map_err(CrawlError::from) },
    )
    .await;
    if let Err(err) = started {
        if matches!(err, CrawlError::Db(DbError::InvalidCrawlRunTransition { .. })) {
            tracing::warn!(run_id = run.id, error = %err, "run already claimed, skipping");
        } else {
            tracing::error!(run_id = run.id, error = %err, "failed to mark run running");
            if let Err(mark_err) = fail_crawl_run(pool, run.id, &err.to_string()).await {
                tracing::error!(run_id = run.id, error = %mark_err, "failed to mark run failed");
            }
        }
        return Err(err);
    }

    let request = CrawlRequest {
        platform: run.platform.clone(),
        external_id: run.external_id.clone(),
        depth: u32::try_from(run.depth).unwrap_or(0),
        priority: run.priority,
    };

    let outcome = retry_with_backoff(
        executor.max_retries(),
        executor.backoff_base_ms(),
        || async {
            if let Err(err) = record_crawl_attempt(pool, run.id).await {
                tracing::warn!(run_id = run.id, error = %err, "failed to record crawl attempt");
            }
            executor.crawl_creator(&request).await
        },
    )
    .await;

    match outcome {
        Ok(summary) => {
            let found = i32::try_from(summary.videos_found).unwrap_or(i32::MAX);
            if let Err(err) = complete_crawl_run(pool, run.id, found).await {
                tracing::error!(run_id = run.id, error = %err, "failed to mark run succeeded");
            }
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(
                run_id = run.id,
                platform = %run.platform,
                external_id = %run.external_id,
                error = %err,
                "crawl run failed"
            );
            if let Err(mark_err) = fail_crawl_run(pool, run.id, &err.to_string()).await {
                tracing::error!(run_id = run.id, error = %mark_err, "failed to mark run failed");
            }
            Err(err)
        }
    }
}

/// Fire-and-forget variant for the scheduler and the API enqueue path.
pub fn spawn_crawl(pool: PgPool, executor: Arc<CrawlExecutor>, run: CrawlRunRow) {
    tokio::spawn(async move {
        // Terminal status and error text are already on the run row.
        let _ = run_crawl(&pool, &executor, &run).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwatch_db::{create_crawl_run, get_crawl_run_by_public_id};
    use cwatch_platform::PlatformRegistry;

    use crate::store::PgCrawlStore;

    fn executor(pool: &PgPool) -> CrawlExecutor {
        // Empty registry: any crawl fails with an unsupported-platform error.
        CrawlExecutor::new(
            Arc::new(PgCrawlStore::new(pool.clone())),
            Arc::new(PlatformRegistry::new()),
            0,
            0,
        )
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn failed_crawl_marks_run_failed(pool: PgPool) {
        let run = create_crawl_run(&pool, "vine", "creator-1", 5, 1, "manual")
            .await
            .expect("create run");

        let result = run_crawl(&pool, &executor(&pool), &run).await;
        assert!(result.is_err());

        let row = get_crawl_run_by_public_id(&pool, run.public_id)
            .await
            .expect("lookup")
            .expect("row exists");
        assert_eq!(row.status, "failed");
        assert!(row.error_message.is_some());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn claimed_run_is_left_to_its_owner(pool: PgPool) {
        let run = create_crawl_run(&pool, "vine", "creator-1", 5, 1, "manual")
            .await
            .expect("create run");
        start_crawl_run(&pool, run.id).await.expect("claim run");

        let result = run_crawl(&pool, &executor(&pool), &run).await;
        assert!(matches!(
            result,
            Err(CrawlError::Db(DbError::InvalidCrawlRunTransition { .. }))
        ));

        // The owning driver's status survives untouched.
        let row = get_crawl_run_by_public_id(&pool, run.public_id)
            .await
            .expect("lookup")
            .expect("row exists");
        assert_eq!(row.status, "running");
        assert!(row.error_message.is_none());
    }
}
