//! Tier fan-out: turns a tier's creator roster into queued crawl runs.

use std::sync::Arc;

use sqlx::PgPool;

use cwatch_core::Tier;
use cwatch_db::{create_crawl_run, list_creators_in_tier, CreatorRow, DbError};

use crate::executor::{CrawlExecutor, CrawlRequest};
use crate::runner::spawn_crawl;

/// The request a tier sweep issues for one creator.
#[must_use]
pub fn tier_request(tier: Tier, creator: &CreatorRow) -> CrawlRequest {
    CrawlRequest {
        platform: creator.platform.clone(),
        external_id: creator.external_id.clone(),
        depth: tier.fetch_depth(),
        priority: tier.priority(),
    }
}

/// Enqueues and spawns one crawl per creator in `tier`, stalest first.
/// Returns the number of runs dispatched.
///
/// A failure to enqueue one creator is logged and skipped; the rest of the
/// sweep proceeds.
///
/// # Errors
///
/// Returns [`DbError`] only when the roster itself cannot be listed.
pub async fn dispatch_tier(
    pool: &PgPool,
    executor: &Arc<CrawlExecutor>,
    tier: Tier,
) -> Result<usize, DbError> {
    let creators = list_creators_in_tier(pool, tier.as_i16()).await?;
    let mut dispatched = 0usize;

    for creator in &creators {
        let request = tier_request(tier, creator);
        let run = match create_crawl_run(
            pool,
            &request.platform,
            &request.external_id,
            i32::try_from(request.depth).unwrap_or(i32::MAX),
            request.priority,
            "scheduled",
        )
        .await
        {
            Ok(run) => run,
            Err(err) => {
                tracing::error!(
                    platform = %creator.platform,
                    external_id = %creator.external_id,
                    error = %err,
                    "failed to enqueue scheduled crawl"
                );
                continue;
            }
        };
        spawn_crawl(pool.clone(), Arc::clone(executor), run);
        dispatched += 1;
    }

    tracing::info!(tier = %tier, dispatched, "tier sweep dispatched");
    Ok(dispatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn creator(platform: &str, external_id: &str) -> CreatorRow {
        CreatorRow {
            id: 1,
            public_id: Uuid::new_v4(),
            platform: platform.to_owned(),
            external_id: external_id.to_owned(),
            handle: None,
            display_name: None,
            tier: Tier::T2.as_i16(),
            last_etag: None,
            last_seen_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn tier_request_carries_depth_and_priority() {
        let row = creator("youtube", "UCabc");
        let request = tier_request(Tier::T0, &row);
        assert_eq!(request.depth, 20);
        assert_eq!(request.priority, 10);
        assert_eq!(request.platform, "youtube");

        let request = tier_request(Tier::T2, &row);
        assert_eq!(request.depth, 5);
        assert_eq!(request.priority, 1);
    }

    async fn seed_creator(pool: &PgPool, external_id: &str, tier: Tier) {
        cwatch_db::upsert_creator(
            pool,
            &cwatch_db::CreatorUpsert {
                platform: "youtube",
                external_id,
                handle: None,
                display_name: None,
                last_etag: None,
            },
        )
        .await
        .expect("seed creator");
        cwatch_db::set_creator_tier(pool, "youtube", external_id, tier.as_i16())
            .await
            .expect("set tier");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn dispatch_creates_one_run_per_creator_in_tier(pool: PgPool) {
        seed_creator(&pool, "UC-a", Tier::T1).await;
        seed_creator(&pool, "UC-b", Tier::T1).await;
        seed_creator(&pool, "UC-other", Tier::T2).await;

        use crate::store::{CrawlStore, PgCrawlStore};
        use cwatch_platform::PlatformRegistry;
        let store: Arc<dyn CrawlStore> = Arc::new(PgCrawlStore::new(pool.clone()));
        let executor = Arc::new(CrawlExecutor::new(
            store,
            Arc::new(PlatformRegistry::new()),
            0,
            0,
        ));

        let dispatched = dispatch_tier(&pool, &executor, Tier::T1)
            .await
            .expect("dispatch");
        assert_eq!(dispatched, 2);

        // Run rows are created before the spawned drivers touch them, so the
        // count and enqueue-time fields are stable to assert.
        let runs = cwatch_db::list_crawl_runs(&pool, 10).await.expect("list");
        assert_eq!(runs.len(), 2);
        for run in &runs {
            assert_eq!(run.depth, 10);
            assert_eq!(run.priority, 5);
            assert_eq!(run.trigger_source, "scheduled");
        }
    }
}
