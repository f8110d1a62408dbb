mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cwatch_crawler::{CrawlExecutor, CrawlStore, PgCrawlStore};
use cwatch_platform::{KvStore, MemoryKv, PlatformRegistry};
use cwatch_youtube::YouTubeClient;

use crate::api::{build_app, AppState, QuotaSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(cwatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(config = ?config, "starting cwatch-server");

    let pool_config = cwatch_db::PoolConfig::from_app_config(&config);
    let pool = cwatch_db::connect_pool(&config.database_url, pool_config).await?;
    cwatch_db::run_migrations(&pool).await?;

    let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
    let mut registry = PlatformRegistry::new();
    let mut quota_sources = Vec::new();

    if let Some(api_key) = config.yt_api_key.as_deref() {
        let client = YouTubeClient::new(
            Arc::clone(&kv),
            api_key,
            config.yt_units_per_min,
            config.platform_request_timeout_secs,
            config.limiter_acquire_timeout_secs,
        )?;
        registry.register(Arc::new(client));
        quota_sources.push(QuotaSource {
            platform: cwatch_youtube::PLATFORM.to_owned(),
            bucket_key: cwatch_youtube::QUOTA_KEY.to_owned(),
            capacity: f64::from(config.yt_units_per_min),
        });
    } else {
        tracing::warn!("CWATCH_YT_API_KEY not set; YouTube crawling disabled");
    }

    let store: Arc<dyn CrawlStore> = Arc::new(PgCrawlStore::new(pool.clone()));
    let executor = Arc::new(CrawlExecutor::new(
        store,
        Arc::new(registry),
        config.crawl_max_retries,
        config.crawl_backoff_base_ms,
    ));

    let _scheduler = scheduler::build_scheduler(pool.clone(), Arc::clone(&executor)).await?;

    let app = build_app(AppState {
        pool,
        executor,
        kv,
        quota_sources: Arc::new(quota_sources),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
