//! Ripple-Walk main entry point
//!
//! This is the command-line interface for the Ripple-Walk link crawler.

use anyhow::Context;
use clap::Parser;
use ripple_walk::config::{load_config_with_hash, validate, Config};
use ripple_walk::crawler::run_crawl;
use ripple_walk::output::print_report;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Ripple-Walk: a depth-bounded link crawler
///
/// Starting from a seed URL, Ripple-Walk follows the site-relative links of
/// each page up to a maximum depth and prints every link it discovers.
#[derive(Parser, Debug)]
#[command(name = "ripple-walk")]
#[command(version)]
#[command(about = "A depth-bounded link crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL (overrides the configuration file)
    #[arg(short, long)]
    url: Option<String>,

    /// Maximum crawl depth (overrides the configuration file)
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Number of concurrent fetch workers (overrides the configuration file)
    #[arg(short, long)]
    workers: Option<u32>,

    /// Fetch one page at a time
    #[arg(long)]
    sequential: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_walk=info,warn"),
            1 => EnvFilter::new("ripple_walk=debug,info"),
            2 => EnvFilter::new("ripple_walk=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration and applies command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.crawler.seed_url = url.clone();
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }

    validate(&config).context("Invalid configuration")?;

    Ok(config)
}

/// Runs the crawl; returns false if the seed could not be reached
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(&cli)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            ctrl_c.cancel();
        }
    });

    let report = run_crawl(&config, cli.sequential, cancel)
        .await
        .context("Crawl failed")?;

    if !cli.quiet {
        println!();
        print_report(&report);
    }

    if report.is_success() {
        tracing::info!("Crawl completed successfully");
    } else {
        tracing::error!("Seed {} could not be crawled", report.seed);
    }

    Ok(report.is_success())
}
