//! Shelfline main entry point
//!
//! Command-line interface for the Shelfline grocery shelf scraper.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

use shelfline::config::load_config_with_hash;
use shelfline::events::EventBus;
use shelfline::navigator::ChromiumFactory;
use shelfline::output::{load_statistics, print_statistics, register_progress_logger};
use shelfline::scraper::Orchestrator;
use shelfline::storage::{Repository, SqliteRepository};

/// Shelfline: a grocery shelf scraper
///
/// Drives a pool of isolated headless browsers over a configured set of
/// category pages, paginates every subcategory, and persists the extracted
/// product listings to SQLite.
#[derive(Parser, Debug)]
#[command(name = "shelfline")]
#[command(version)]
#[command(about = "A grocery shelf scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run the browser with a visible window regardless of configuration
    #[arg(long)]
    headed: bool,

    /// Validate config and show what would be scraped without launching a
    /// browser
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.headed {
        config.browser.headless = false;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_scrape(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelfline=info,warn"),
            1 => EnvFilter::new("shelfline=debug,info"),
            2 => EnvFilter::new("shelfline=trace,debug"),
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

/// Handles --dry-run: shows what would be scraped
fn handle_dry_run(config: &shelfline::Config) {
    println!("=== Shelfline Dry Run ===\n");

    println!("Scraper Configuration:");
    println!(
        "  Max pages per subcategory: {}",
        config.scraper.max_pages_per_subcategory
    );
    println!("  Settle time: {}ms", config.scraper.settle_ms);
    println!(
        "  Excluded link texts: {:?}",
        config.scraper.excluded_link_texts
    );

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Viewport: {}x{}",
        config.browser.viewport.width, config.browser.viewport.height
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nTarget URLs ({}):", config.scraper.urls.len());
    for url in &config.scraper.urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: shows statistics from the database
fn handle_stats(config: &shelfline::Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let repository = SqliteRepository::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&repository)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: shelfline::Config, config_hash: String) -> anyhow::Result<()> {
    tracing::info!(
        "Scraping {} URL(s), headless: {}",
        config.scraper.urls.len(),
        config.browser.headless
    );

    let repository = SqliteRepository::new(Path::new(&config.output.database_path))?;
    let repository: Arc<Mutex<dyn Repository + Send>> = Arc::new(Mutex::new(repository));

    let bus = EventBus::new();
    let _progress = register_progress_logger(&bus);

    let orchestrator = Orchestrator::new(
        config,
        config_hash,
        repository,
        Arc::new(ChromiumFactory),
        bus,
    );

    match orchestrator.run().await {
        Ok(summary) => {
            tracing::info!(
                "Scrape completed: {}/{} URLs, {} products",
                summary.successful_urls,
                summary.total_urls,
                summary.total_products
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
