//! Crawl coordinator - the breadth-first traversal engine
//!
//! This module contains the main crawl loop, which:
//! - Admits seeds through the record store's gate and persists them
//! - Drains the frontier in FIFO order, expanding references before citations
//! - Fetches each newly discovered paper exactly once
//! - Persists and enqueues every fetched record
//! - Applies the failure policy and honours cancellation
//! - Records the run in the optional ledger

use crate::config::{Config, FailurePolicy};
use crate::crawler::{
    fetch_seed_ids, resolve_seeds, seed_titles_from_dir, ApiSeedResolver, FetchError, Frontier,
    HttpFetcher, PaperFetcher,
};
use crate::output::{generate_markdown_summary, generate_summary, JsonSink, SaveOutcome};
use crate::paper::{EdgeKind, PaperRecord};
use crate::state::{RecordStore, Slot, VisitedSet};
use crate::storage::{open_storage, RunStatus, Storage};
use crate::RippleError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Lifecycle of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Done,
}

/// A file rewritten by a different paper whose title has the same slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugCollision {
    pub path: PathBuf,
    /// Paper whose file was replaced
    pub overwritten: String,
    /// Paper now on disk
    pub paper_id: String,
}

/// What a crawl did
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Ledger run, when a ledger is attached
    pub run_id: Option<i64>,

    /// Distinct seeds admitted
    pub seeds: usize,

    /// Successful fetches of discovered papers
    pub fetched: usize,

    /// Records written to disk, seeds included
    pub persisted: usize,

    /// Ids of records kept in memory but not written for lack of a title
    pub untitled: Vec<String>,

    /// `(id, error)` of papers whose fetch failed
    pub failed: Vec<(String, String)>,

    pub collisions: Vec<SlugCollision>,

    /// Expanded ids in visitation order
    pub visit_order: Vec<String>,

    /// True if the crawl stopped on cancellation
    pub cancelled: bool,
}

struct Ledger {
    storage: Box<dyn Storage>,
    run_id: i64,
}

/// Main crawl coordinator structure
pub struct Coordinator {
    fetcher: Arc<dyn PaperFetcher>,
    sink: JsonSink,
    store: RecordStore,
    frontier: Frontier,
    visited: VisitedSet,
    policy: FailurePolicy,
    ledger: Option<Ledger>,
    cancel: CancellationToken,
    state: EngineState,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates an idle coordinator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of paper records, rate limited by its own cooldown
    /// * `sink` - Where records are written
    /// * `policy` - What to do with papers whose fetch fails
    pub fn new(fetcher: Arc<dyn PaperFetcher>, sink: JsonSink, policy: FailurePolicy) -> Self {
        Self {
            fetcher,
            sink,
            store: RecordStore::new(),
            frontier: Frontier::new(),
            visited: VisitedSet::new(),
            policy,
            ledger: None,
            cancel: CancellationToken::new(),
            state: EngineState::Idle,
            report: CrawlReport::default(),
        }
    }

    /// Attaches a run ledger and opens a new run in it
    pub fn with_ledger(
        mut self,
        mut storage: Box<dyn Storage>,
        config_hash: &str,
    ) -> Result<Self, RippleError> {
        let run_id = storage.create_run(config_hash)?;
        tracing::info!("Starting ledger run {}", run_id);

        self.report.run_id = Some(run_id);
        self.ledger = Some(Ledger { storage, run_id });
        Ok(self)
    }

    /// Uses `token` to stop the crawl from outside
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn report(&self) -> &CrawlReport {
        &self.report
    }

    /// The attached ledger and the id of this crawl's run in it
    pub fn ledger(&self) -> Option<(&dyn Storage, i64)> {
        self.ledger
            .as_ref()
            .map(|ledger| (ledger.storage.as_ref(), ledger.run_id))
    }

    /// Admits seed records and appends them to the frontier
    ///
    /// Seeds go through the same gate as discovered papers, so duplicates
    /// are ignored, also across calls. Each new seed is persisted right away.
    ///
    /// # Returns
    ///
    /// The number of distinct seeds admitted
    pub fn seed(&mut self, records: Vec<PaperRecord>) -> Result<usize, RippleError> {
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let id = record.id.clone();
            if id.is_empty() {
                tracing::warn!("Ignoring seed without a paper id");
                continue;
            }
            if !self.store.put_record_if_absent(record) {
                tracing::debug!("Ignoring duplicate seed {}", id);
                continue;
            }

            let stored = self.store.get(&id)?;
            self.persist(&stored)?;
            ids.push(id);
        }

        tracing::info!("Seeded frontier with {} papers", ids.len());
        self.report.seeds += ids.len();
        let admitted = ids.len();
        for id in ids {
            self.frontier.enqueue(id);
        }
        Ok(admitted)
    }

    /// Runs the crawl until the frontier is empty or the token is cancelled
    ///
    /// The ledger run is closed as `completed`, `interrupted` or `failed`.
    pub async fn run(&mut self) -> Result<CrawlReport, RippleError> {
        self.state = EngineState::Running;
        tracing::info!("Starting crawl with {} seeds", self.frontier.len());

        let start_time = Instant::now();
        let outcome = self.drain().await;
        self.state = EngineState::Done;
        self.report.visit_order = self.visited.order().to_vec();

        let status = match &outcome {
            Err(_) => RunStatus::Failed,
            Ok(()) if self.report.cancelled => RunStatus::Interrupted,
            Ok(()) => RunStatus::Completed,
        };

        if let Some(ledger) = self.ledger.as_mut() {
            if let Err(e) = ledger.storage.finish_run(ledger.run_id, status) {
                if outcome.is_ok() {
                    return Err(e.into());
                }
                tracing::error!("Failed to close ledger run {}: {}", ledger.run_id, e);
            }
        }
        outcome?;

        tracing::info!(
            "Crawl {}: {} papers expanded, {} fetched, {} written, {} failed in {:?}",
            status.to_db_string(),
            self.report.visit_order.len(),
            self.report.fetched,
            self.report.persisted,
            self.report.failed.len(),
            start_time.elapsed()
        );

        Ok(self.report.clone())
    }

    async fn drain(&mut self) -> Result<(), RippleError> {
        let start_time = Instant::now();
        let mut expanded = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    "Crawl cancelled with {} papers still queued",
                    self.frontier.len()
                );
                self.report.cancelled = true;
                return Ok(());
            }

            let Some(id) = self.frontier.dequeue() else {
                tracing::info!("Frontier is empty, crawl complete");
                return Ok(());
            };

            if !self.visited.mark(&id) {
                continue;
            }

            let record = self.store.get(&id)?;
            self.expand(&record).await?;
            expanded += 1;

            if expanded % 10 == 0 {
                let rate = expanded as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} papers expanded, {} known, {} in frontier, {:.2} papers/sec",
                    expanded,
                    self.store.len(),
                    self.frontier.len(),
                    rate
                );
            }
        }
    }

    /// Walks the references, then the citations, of one stored record
    async fn expand(&mut self, record: &PaperRecord) -> Result<(), RippleError> {
        for kind in EdgeKind::ORDER {
            for target in record.edge_ids(kind) {
                if self.cancel.is_cancelled() {
                    return Ok(());
                }
                self.discover(&record.id, target, kind).await?;
            }
        }
        Ok(())
    }

    /// Fetches, stores, persists and enqueues `target` if it is new
    async fn discover(
        &mut self,
        parent: &str,
        target: &str,
        kind: EdgeKind,
    ) -> Result<(), RippleError> {
        if !self.store.put_if_absent(target, Slot::Pending) {
            return Ok(());
        }

        tracing::debug!("Fetching {} (in {} of {})", target, kind, parent);
        match self.fetcher.fetch_by_id(target).await {
            Ok(fetched) => {
                self.report.fetched += 1;
                let stored = self.store.fulfill(target, fetched)?;
                if !stored.id.is_empty() && stored.id != target {
                    // Edges naming the canonical id must not fetch it again
                    if !self
                        .store
                        .put_if_absent(&stored.id, Slot::Stored(Arc::clone(&stored)))
                    {
                        tracing::debug!(
                            "Canonical id {} of {} already known",
                            stored.id,
                            target
                        );
                    }
                }
                self.persist(&stored)?;
                self.frontier.enqueue(target);
                Ok(())
            }
            Err(e) => self.handle_failure(target, e),
        }
    }

    fn handle_failure(&mut self, id: &str, error: FetchError) -> Result<(), RippleError> {
        let reason = error.to_string();
        self.store.mark_failed(id, reason.clone())?;

        if let Some(ledger) = self.ledger.as_mut() {
            ledger
                .storage
                .record_failure(ledger.run_id, id, error.kind(), &reason)?;
        }
        self.report.failed.push((id.to_string(), reason));

        match self.policy {
            FailurePolicy::Skip => {
                tracing::warn!("Skipping paper {} ({}): {}", id, error.kind(), error);
                Ok(())
            }
            FailurePolicy::Abort => {
                tracing::error!("Aborting crawl on paper {}: {}", id, error);
                Err(error.into())
            }
        }
    }

    fn persist(&mut self, record: &PaperRecord) -> Result<(), RippleError> {
        match self.sink.save(record)? {
            SaveOutcome::Written {
                path,
                collided_with,
            } => {
                self.report.persisted += 1;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();

                if let Some(ledger) = self.ledger.as_mut() {
                    ledger.storage.record_persisted(
                        ledger.run_id,
                        &record.id,
                        record.title.as_deref(),
                        &file_name,
                    )?;
                }

                if let Some(previous) = collided_with {
                    tracing::warn!(
                        "Paper {} overwrote {} written by paper {}",
                        record.id,
                        file_name,
                        previous
                    );
                    self.report.collisions.push(SlugCollision {
                        path,
                        overwritten: previous,
                        paper_id: record.id.clone(),
                    });
                } else {
                    tracing::debug!("Wrote {}", path.display());
                }
            }
            SaveOutcome::Untitled => {
                tracing::warn!("Paper {} has no usable title, not written", record.id);
                self.report.untitled.push(record.id.clone());
            }
        }
        Ok(())
    }
}

/// Collects seed records from every configured source
///
/// Titles (listed ones first, then those read from `titles-dir`) are
/// resolved through the search API; ids are fetched directly. Seeds that
/// fail to resolve are dropped with a warning.
pub async fn gather_seeds(
    config: &Config,
    fetcher: &HttpFetcher,
) -> Result<Vec<PaperRecord>, RippleError> {
    let mut titles = config.seeds.titles.clone();
    if let Some(dir) = &config.seeds.titles_dir {
        let from_dir = seed_titles_from_dir(dir)?;
        tracing::info!("Read {} seed titles from {}", from_dir.len(), dir.display());
        titles.extend(from_dir);
    }

    let shared: Arc<dyn PaperFetcher> = Arc::new(fetcher.clone());
    let mut seeds = Vec::new();

    if !titles.is_empty() {
        let resolver = ApiSeedResolver::new(
            fetcher.client().clone(),
            Url::parse(&config.fetcher.search_url)?,
            fetcher.cooldown().clone(),
            Arc::clone(&shared),
            config.seeds.max_title_distance,
        );
        seeds.extend(resolve_seeds(&resolver, &titles).await);
    }

    if !config.seeds.ids.is_empty() {
        seeds.extend(fetch_seed_ids(shared.as_ref(), &config.seeds.ids).await);
    }

    Ok(seeds)
}

/// Runs a complete crawl from a configuration
///
/// This function orchestrates the entire process:
///
/// 1. Build the HTTP fetcher and its cooldown
/// 2. Resolve seed titles and fetch seed ids
/// 3. Open the output directory and the run ledger
/// 4. Seed the coordinator and drain the frontier
/// 5. Write the markdown summary of the run
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `config_hash` - Hash of the configuration file, stored on the ledger run
/// * `cancel` - Token that stops the crawl when cancelled
///
/// # Example
///
/// ```no_run
/// use cite_ripple::config::load_config_with_hash;
/// use cite_ripple::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let report = run_crawl(&config, &hash, CancellationToken::new()).await?;
/// println!("{} papers written", report.persisted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    config_hash: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, RippleError> {
    let fetcher = HttpFetcher::from_config(config)?;
    let seeds = gather_seeds(config, &fetcher).await?;
    if seeds.is_empty() {
        tracing::warn!("No seed could be resolved, nothing to crawl");
    }

    let sink = JsonSink::new(&config.output.directory)?;
    let storage = open_storage(Path::new(&config.output.database_path))?;

    let mut coordinator = Coordinator::new(
        Arc::new(fetcher),
        sink,
        config.fetcher.on_fetch_failure,
    )
    .with_cancellation(cancel)
    .with_ledger(Box::new(storage), config_hash)?;

    coordinator.seed(seeds)?;
    let result = coordinator.run().await;

    if let Some((storage, run_id)) = coordinator.ledger() {
        let summary_path = Path::new(&config.output.summary_path);
        match generate_summary(storage, run_id)
            .and_then(|summary| generate_markdown_summary(&summary, summary_path))
        {
            Ok(()) => tracing::info!("Summary written to {}", summary_path.display()),
            Err(e) => tracing::warn!("Failed to write summary: {}", e),
        }
    }

    result
}
