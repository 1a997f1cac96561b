//! Crawler module for citation graph traversal
//!
//! This module contains the core crawling logic, including:
//! - Paper API fetching with retry logic
//! - The shared cooldown between API calls
//! - Seed resolution from titles
//! - The breadth-first traversal itself

mod cooldown;
mod coordinator;
mod fetcher;
mod frontier;
mod resolver;

pub use cooldown::Cooldown;
pub use coordinator::{
    gather_seeds, run_crawl, Coordinator, CrawlReport, EngineState, SlugCollision,
};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PaperFetcher, RetryPolicy};
pub use frontier::Frontier;
pub use resolver::{
    fetch_seed_ids, resolve_seeds, seed_titles_from_dir, ApiSeedResolver, ResolveError,
    SeedResolver,
};

use crate::config::Config;
use crate::RippleError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl that can only end by draining the frontier
///
/// See [`run_crawl`] for a crawl that can be cancelled.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed successfully
/// * `Err(RippleError)` - Crawl failed
pub async fn crawl(config: &Config, config_hash: &str) -> Result<CrawlReport, RippleError> {
    run_crawl(config, config_hash, CancellationToken::new()).await
}
