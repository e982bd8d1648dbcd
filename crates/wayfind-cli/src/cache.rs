//! `cache` subcommands, run directly against the Postgres store.

use clap::Subcommand;
use wayfind_core::{AppConfig, ContentCache};
use wayfind_db::PgContentCache;

#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Show cached row and hit totals
    Stats,
    /// Delete expired rows and rows older than the cutoff
    Cleanup {
        /// Age cutoff in days (defaults to WAYFIND_CACHE_CLEANUP_DAYS)
        #[arg(long)]
        older_than_days: Option<u32>,
    },
}

pub(crate) async fn run_cache_command(
    config: &AppConfig,
    command: CacheCommands,
) -> anyhow::Result<()> {
    let pool = wayfind_db::connect_pool_from_config(config).await?;
    let cache = PgContentCache::new(pool);

    match command {
        CacheCommands::Stats => {
            let stats = cache.stats().await?;
            println!("cached entries: {}", stats.total_cached);
            println!("total hits:     {}", stats.total_hits);
        }
        CacheCommands::Cleanup { older_than_days } => {
            let days = older_than_days.unwrap_or(config.cache_cleanup_days);
            let removed = cache.cleanup(days).await?;
            tracing::info!(removed, older_than_days = days, "cache cleanup complete");
            println!("removed {removed} cache entr{}", if removed == 1 { "y" } else { "ies" });
        }
    }
    Ok(())
}
