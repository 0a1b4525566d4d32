//! Tally CLI
//!
//! Fetches URLs through the counting cache, reads access counts, and runs
//! the HTTP service.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tally_api::{ApiConfig, ApiServer, AppState};
use tally_core::types::CacheOutcome;

/// Tally - counting read-through cache for web pages
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Redis URL (in-memory store when unset)
    #[arg(long, env = "REDIS_URL", global = true)]
    redis_url: Option<String>,

    /// Cache entry TTL in seconds
    #[arg(long, env = "TALLY_TTL_SECONDS", global = true)]
    ttl_seconds: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL through the cache
    Get {
        /// URL to fetch
        url: String,
        /// Number of times to fetch it
        #[arg(short, long, default_value = "2")]
        repeat: u32,
        /// Print body sizes instead of bodies
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show how many times a URL was requested
    Count {
        /// URL to look up
        url: String,
    },

    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "TALLY_PORT", default_value = "3001")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tally=debug,info"
    } else {
        "tally=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = api_config(&cli)?;

    match cli.command {
        Commands::Get { url, repeat, quiet } => cmd_get(config, &url, repeat, quiet).await,
        Commands::Count { url } => cmd_count(config, &url).await,
        Commands::Serve { port, bind } => cmd_serve(config, port, &bind).await,
    }
}

/// Environment config with command-line overrides applied.
fn api_config(cli: &Cli) -> Result<ApiConfig> {
    let mut config = ApiConfig::from_env().context("Invalid environment configuration")?;
    if let Some(url) = &cli.redis_url {
        config.redis_url = Some(url.clone());
    }
    if let Some(ttl) = cli.ttl_seconds {
        config.cache.ttl_seconds = ttl;
    }
    config.cache.validate().context("Invalid cache configuration")?;
    Ok(config)
}

fn store_label(config: &ApiConfig) -> &'static str {
    if config.redis_url.is_some() {
        "redis"
    } else {
        "memory"
    }
}

/// Fetch a URL `repeat` times and report hits, misses, and the final count
async fn cmd_get(config: ApiConfig, url: &str, repeat: u32, quiet: bool) -> Result<()> {
    println!(
        "{} {} {}",
        "🌐 Fetching:".cyan().bold(),
        url,
        format!("(store: {}, ttl: {}s)", store_label(&config), config.cache.ttl_seconds).dimmed()
    );

    let state = AppState::from_config(config)
        .await
        .context("Failed to set up the cache")?;

    for attempt in 1..=repeat.max(1) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("Invalid spinner template")?,
        );
        spinner.set_message(format!("request {}/{}", attempt, repeat.max(1)));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let result = state.cache.lookup(url).await;
        spinner.finish_and_clear();

        let lookup = result.with_context(|| format!("Failed to fetch {}", url))?;
        let outcome = match lookup.outcome {
            CacheOutcome::Hit => "HIT".green().bold(),
            CacheOutcome::Miss => "MISS".yellow().bold(),
        };

        println!("\n{} #{} {}", "▶".dimmed(), attempt, outcome);
        if quiet {
            println!("   {} {} bytes", "Body:".dimmed(), lookup.value.len());
        } else {
            println!("{}", lookup.value);
        }
    }

    let count = state
        .cache
        .access_count(url)
        .await
        .context("Failed to read access count")?;
    println!("\n{} {}: {}", "📊 Access count for".green().bold(), url, count);

    Ok(())
}

/// Print the access count of a URL
async fn cmd_count(config: ApiConfig, url: &str) -> Result<()> {
    if config.redis_url.is_none() {
        println!(
            "{}",
            "⚠️  No REDIS_URL set: counts live only as long as this process.".yellow()
        );
    }

    let state = AppState::from_config(config)
        .await
        .context("Failed to set up the cache")?;
    let count = state
        .cache
        .access_count(url)
        .await
        .context("Failed to read access count")?;

    println!("{} {}: {}", "📊 Access count for".green().bold(), url, count);
    Ok(())
}

/// Run the API server
async fn cmd_serve(mut config: ApiConfig, port: u16, bind: &str) -> Result<()> {
    let ip: IpAddr = bind.parse().context("Invalid bind address")?;
    config.port = port;

    println!(
        "{} {}:{} {}",
        "🚀 Starting Tally API on".cyan().bold(),
        ip,
        port,
        format!("(store: {})", store_label(&config)).dimmed()
    );

    let server = ApiServer::from_config(config)
        .await
        .context("Failed to start API server")?;
    server
        .run(SocketAddr::new(ip, port))
        .await
        .context("API server failed")?;

    Ok(())
}
