//! Cite-Ripple main entry point
//!
//! This is the command-line interface for the Cite-Ripple citation crawler.

use anyhow::{Context, Result};
use cite_ripple::config::{load_config_with_hash, Config};
use cite_ripple::crawler::run_crawl;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Cite-Ripple: a polite citation graph crawler
///
/// Cite-Ripple starts from a set of seed papers and follows their references
/// and citations breadth-first, fetching every paper it discovers once and
/// writing one JSON file per paper.
#[derive(Parser, Debug)]
#[command(name = "cite-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A polite citation graph crawler", long_about = None)]
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

    /// Validate config and show the seed sources without crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics of the latest run from the ledger and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.export_summary {
        handle_export_summary(&config)
    } else {
        handle_crawl(&config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cite_ripple=info,warn"),
            1 => EnvFilter::new("cite_ripple=debug,info"),
            2 => EnvFilter::new("cite_ripple=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the seed sources
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("=== Cite-Ripple Dry Run ===\n");

    println!("Fetcher Configuration:");
    println!("  API base URL: {}", config.fetcher.api_base_url);
    println!("  Search URL: {}", config.fetcher.search_url);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Cooldown: {}ms", config.fetcher.cooldown_ms);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.fetcher.max_retries, config.fetcher.retry_backoff_ms
    );
    println!("  On fetch failure: {:?}", config.fetcher.on_fetch_failure);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nSeed Titles ({}):", config.seeds.titles.len());
    for title in &config.seeds.titles {
        println!("  - {}", title);
    }

    let mut seed_count = config.seeds.titles.len() + config.seeds.ids.len();
    if let Some(dir) = &config.seeds.titles_dir {
        let titles = cite_ripple::crawler::seed_titles_from_dir(dir)
            .with_context(|| format!("failed to read seed titles from {}", dir.display()))?;
        println!("\nSeed Titles from {} ({}):", dir.display(), titles.len());
        for title in &titles {
            println!("  - {}", title);
        }
        seed_count += titles.len();
    }

    println!("\nSeed IDs ({}):", config.seeds.ids.len());
    for id in &config.seeds.ids {
        println!("  - {}", id);
    }

    println!(
        "\nTitles must match within an edit distance of {}",
        config.seeds.max_title_distance
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {} seeds", seed_count);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the ledger
fn handle_stats(config: &Config) -> Result<()> {
    use cite_ripple::output::{load_statistics, print_statistics};
    use cite_ripple::storage::SqliteStorage;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    match load_statistics(&storage)? {
        Some(stats) => print_statistics(&stats),
        None => println!("No crawl runs recorded yet"),
    }

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> Result<()> {
    use cite_ripple::output::{generate_latest_summary, generate_markdown_summary};
    use cite_ripple::storage::SqliteStorage;

    println!("=== Exporting Crawl Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    tracing::info!("Loading crawl data from database...");
    let summary = generate_latest_summary(&storage)?
        .context("no crawl runs found in database")?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> Result<()> {
    tracing::info!(
        "Seeds: {} titles, {} ids{}",
        config.seeds.titles.len(),
        config.seeds.ids.len(),
        config
            .seeds
            .titles_dir
            .as_ref()
            .map(|dir| format!(", titles from {}", dir.display()))
            .unwrap_or_default()
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current fetch");
            on_interrupt.cancel();
        }
    });

    let report = run_crawl(config, config_hash, cancel)
        .await
        .context("crawl failed")?;

    if report.cancelled {
        tracing::info!("Crawl interrupted");
    } else {
        tracing::info!("Crawl completed successfully");
    }
    tracing::info!(
        "{} seeds, {} papers expanded, {} written, {} untitled, {} failed, {} filename collisions",
        report.seeds,
        report.visit_order.len(),
        report.persisted,
        report.untitled.len(),
        report.failed.len(),
        report.collisions.len()
    );

    Ok(())
}
