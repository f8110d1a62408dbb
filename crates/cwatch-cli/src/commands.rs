//! Command handlers, called from `main` after the pool and config are
//! established.
//!
//! CLI crawls run synchronously so the exit code reflects the outcome; the
//! sweep walks its roster one creator at a time, logging and skipping
//! per-creator failures rather than aborting the batch.

use std::sync::Arc;

use sqlx::PgPool;

use cwatch_core::{AppConfig, Tier};
use cwatch_crawler::{run_crawl, tier_request, CrawlExecutor, CrawlStore, PgCrawlStore};
use cwatch_platform::{KvStore, MemoryKv, PlatformRegistry};
use cwatch_youtube::YouTubeClient;

fn build_executor(pool: &PgPool, config: &AppConfig) -> anyhow::Result<Arc<CrawlExecutor>> {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
    let mut registry = PlatformRegistry::new();

    if let Some(api_key) = config.yt_api_key.as_deref() {
        let client = YouTubeClient::new(
            Arc::clone(&kv),
            api_key,
            config.yt_units_per_min,
            config.platform_request_timeout_secs,
            config.limiter_acquire_timeout_secs,
        )?;
        registry.register(Arc::new(client));
    }

    let store: Arc<dyn CrawlStore> = Arc::new(PgCrawlStore::new(pool.clone()));
    Ok(Arc::new(CrawlExecutor::new(
        store,
        Arc::new(registry),
        config.crawl_max_retries,
        config.crawl_backoff_base_ms,
    )))
}

/// Crawl a single creator and print the summary.
///
/// # Errors
///
/// Returns an error when the depth is out of range, the run cannot be
/// created, or the crawl fails terminally.
pub(crate) async fn run_crawl_once(
    pool: &PgPool,
    config: &AppConfig,
    platform: &str,
    external_id: &str,
    depth: u32,
) -> anyhow::Result<()> {
    anyhow::ensure!((1..=50).contains(&depth), "depth must be between 1 and 50");
    let executor = build_executor(pool, config)?;

    let run = cwatch_db::create_crawl_run(
        pool,
        platform,
        external_id,
        i32::try_from(depth)?,
        Tier::T0.priority(),
        "cli",
    )
    .await?;

    let summary = run_crawl(pool, &executor, &run)
        .await
        .map_err(|e| anyhow::anyhow!("crawl failed: {e}"))?;
    println!(
        "crawled {platform}/{external_id}: {} videos, {} snapshots (run {})",
        summary.videos_found, summary.snapshots_written, run.public_id
    );
    Ok(())
}

/// Crawl every creator in `tier` sequentially, printing a per-creator line.
///
/// # Errors
///
/// Returns an error only when the roster cannot be listed or a run row cannot
/// be created; individual crawl failures are logged and counted.
pub(crate) async fn run_tier_sweep(
    pool: &PgPool,
    config: &AppConfig,
    tier: Tier,
) -> anyhow::Result<()> {
    let executor = build_executor(pool, config)?;
    let creators = cwatch_db::list_creators_in_tier(pool, tier.as_i16()).await?;
    println!("sweeping tier {tier}: {} creators", creators.len());

    let mut failures = 0usize;
    for creator in &creators {
        let request = tier_request(tier, creator);
        let run = cwatch_db::create_crawl_run(
            pool,
            &request.platform,
            &request.external_id,
            i32::try_from(request.depth)?,
            request.priority,
            "cli",
        )
        .await?;

        match run_crawl(pool, &executor, &run).await {
            Ok(summary) => println!(
                "  {}/{}: {} videos, {} snapshots",
                creator.platform,
                creator.external_id,
                summary.videos_found,
                summary.snapshots_written
            ),
            Err(err) => {
                failures += 1;
                tracing::error!(
                    platform = %creator.platform,
                    external_id = %creator.external_id,
                    error = %err,
                    "crawl failed during sweep"
                );
            }
        }
    }

    println!(
        "tier {tier} sweep done: {} ok, {failures} failed",
        creators.len() - failures
    );
    Ok(())
}

/// Reassign a creator's tier.
///
/// # Errors
///
/// Returns an error when the creator does not exist or the update fails.
pub(crate) async fn set_tier(
    pool: &PgPool,
    platform: &str,
    external_id: &str,
    tier: Tier,
) -> anyhow::Result<()> {
    cwatch_db::set_creator_tier(pool, platform, external_id, tier.as_i16()).await?;
    println!("{platform}/{external_id} moved to tier {tier}");
    Ok(())
}
