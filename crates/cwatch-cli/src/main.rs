mod commands;

use clap::{Parser, Subcommand};

use cwatch_core::Tier;

#[derive(Debug, Parser)]
#[command(name = "cwatch-cli")]
#[command(about = "creatorwatch command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl one creator immediately and wait for the result.
    Crawl {
        #[arg(long, default_value = "youtube")]
        platform: String,
        #[arg(long)]
        external_id: String,
        /// How many recent items to fetch (1..=50).
        #[arg(long, default_value_t = 10)]
        depth: u32,
    },
    /// Crawl every creator in a tier, one at a time.
    Sweep {
        #[arg(long)]
        tier: Tier,
    },
    /// Reassign a creator's crawl tier.
    SetTier {
        #[arg(long, default_value = "youtube")]
        platform: String,
        #[arg(long)]
        external_id: String,
        #[arg(long)]
        tier: Tier,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = cwatch_core::load_app_config()?;
    let pool_config = cwatch_db::PoolConfig::from_app_config(&config);
    let pool = cwatch_db::connect_pool(&config.database_url, pool_config).await?;
    cwatch_db::run_migrations(&pool).await?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            platform,
            external_id,
            depth,
        } => commands::run_crawl_once(&pool, &config, &platform, &external_id, depth).await,
        Commands::Sweep { tier } => commands::run_tier_sweep(&pool, &config, tier).await,
        Commands::SetTier {
            platform,
            external_id,
            tier,
        } => commands::set_tier(&pool, &platform, &external_id, tier).await,
    }
}
