mod cache;
mod process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cache::CacheCommands;

#[derive(Debug, Parser)]
#[command(name = "wayfind-cli")]
#[command(about = "Turn travel content URLs into enriched place lists")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract and enrich places from a video, thread, or post URL
    Process {
        url: String,
        /// Use a throwaway in-process cache instead of Postgres
        #[arg(long)]
        memory_cache: bool,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or prune the content cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Apply pending database migrations
    Migrate,
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = wayfind_core::load_app_config()?;
    init_tracing(&config.log_level)?;

    match cli.command {
        Commands::Process {
            url,
            memory_cache,
            json,
        } => process::run_process(&config, &url, memory_cache, json).await,
        Commands::Cache { command } => cache::run_cache_command(&config, command).await,
        Commands::Migrate => {
            let pool = wayfind_db::connect_pool_from_config(&config).await?;
            let applied = wayfind_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
    }
}
