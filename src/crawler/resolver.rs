//! Seed resolution
//!
//! Turns human-readable titles into seed records. A title is looked up with
//! the search API, the first hit's title is checked against the requested
//! one, and the hit's full record is fetched through the crawl's fetcher so
//! seed lookups share its cooldown.

use crate::crawler::fetcher::fetch_json;
use crate::crawler::{Cooldown, FetchError, PaperFetcher};
use crate::paper::{title_distance, PaperRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Errors that drop a seed
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no search result for '{0}'")]
    NotFound(String),

    #[error("title mismatch for '{requested}': found '{found}' (distance {distance})")]
    TitleMismatch {
        requested: String,
        found: String,
        distance: usize,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Maps a title to a validated seed record
#[async_trait]
pub trait SeedResolver: Send + Sync {
    async fn resolve(&self, title: &str) -> Result<PaperRecord, ResolveError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "paperId")]
    paper_id: Option<String>,
    title: Option<String>,
}

/// Resolves titles with the paper search API
pub struct ApiSeedResolver {
    client: Client,
    search_url: Url,
    cooldown: Cooldown,
    fetcher: Arc<dyn PaperFetcher>,
    max_distance: usize,
}

impl ApiSeedResolver {
    /// Creates a resolver
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client for search requests
    /// * `search_url` - Search endpoint, queried with `query`, `limit` and `fields`
    /// * `cooldown` - Cooldown shared with the paper fetcher
    /// * `fetcher` - Fetcher used to load the full record of the matched paper
    /// * `max_distance` - Largest accepted title edit distance
    pub fn new(
        client: Client,
        search_url: Url,
        cooldown: Cooldown,
        fetcher: Arc<dyn PaperFetcher>,
        max_distance: usize,
    ) -> Self {
        Self {
            client,
            search_url,
            cooldown,
            fetcher,
            max_distance,
        }
    }

    fn search_request_url(&self, title: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("query", title)
            .append_pair("limit", "1")
            .append_pair("fields", "title");
        url
    }

    /// Checks a resolved title against the requested one
    pub fn check_title(&self, requested: &str, found: &str) -> Result<(), ResolveError> {
        let distance = title_distance(requested, found);
        if distance > self.max_distance {
            return Err(ResolveError::TitleMismatch {
                requested: requested.to_string(),
                found: found.to_string(),
                distance,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SeedResolver for ApiSeedResolver {
    async fn resolve(&self, title: &str) -> Result<PaperRecord, ResolveError> {
        let title = title.trim();
        let url = self.search_request_url(title);

        let response: SearchResponse = self
            .cooldown
            .run(fetch_json(&self.client, url, title))
            .await?;

        let hit = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(title.to_string()))?;

        let paper_id = hit
            .paper_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ResolveError::NotFound(title.to_string()))?;

        self.check_title(title, hit.title.as_deref().unwrap_or_default())?;

        tracing::debug!("Resolved '{}' to paper {}", title, paper_id);
        Ok(self.fetcher.fetch_by_id(&paper_id).await?)
    }
}

/// Resolves every title, dropping the ones that fail
///
/// Failures (mismatched titles, empty searches, fetch errors) are logged and
/// never abort the run. Results keep the order of `titles`.
pub async fn resolve_seeds(resolver: &dyn SeedResolver, titles: &[String]) -> Vec<PaperRecord> {
    let mut seeds = Vec::with_capacity(titles.len());

    for title in titles {
        match resolver.resolve(title).await {
            Ok(record) => seeds.push(record),
            Err(e) => tracing::warn!("Dropping seed '{}': {}", title, e),
        }
    }

    tracing::info!("Resolved {}/{} seed titles", seeds.len(), titles.len());
    seeds
}

/// Fetches seeds given directly by paper id, dropping the ones that fail
pub async fn fetch_seed_ids(fetcher: &dyn PaperFetcher, ids: &[String]) -> Vec<PaperRecord> {
    let mut seeds = Vec::with_capacity(ids.len());

    for id in ids {
        match fetcher.fetch_by_id(id).await {
            Ok(record) => seeds.push(record),
            Err(e) => tracing::warn!("Dropping seed {}: {}", id, e),
        }
    }

    seeds
}

/// Reads seed titles from the file names of a directory
///
/// Each entry contributes its file stem, trimmed (`"Attention Is All You
/// Need.pdf"` gives `"Attention Is All You Need"`). Titles are sorted so runs
/// are reproducible.
pub fn seed_titles_from_dir(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut titles = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            let stem = stem.trim();
            if !stem.is_empty() {
                titles.push(stem.to_string());
            }
        }
    }

    titles.sort();
    Ok(titles)
}
