//! Output module for crawl results
//!
//! This module handles:
//! - Writing one JSON file per paper (the persistence sink)
//! - Generating markdown summaries of a run from the ledger
//! - Printing ledger statistics

mod markdown;
mod sink;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sink::{to_pretty_json, JsonSink, SaveOutcome, SinkError, SinkResult};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, OutputError, OutputResult};

use crate::storage::Storage;
use std::collections::HashSet;

/// Generates a summary of one run from the ledger
///
/// # Arguments
///
/// * `storage` - The ledger holding the run
/// * `run_id` - The run to summarize
pub fn generate_summary(storage: &dyn Storage, run_id: i64) -> OutputResult<CrawlSummary> {
    let run = storage.get_run(run_id)?;

    let duration_seconds = match (
        run.started_at.parse::<chrono::DateTime<chrono::Utc>>(),
        run.finished_at
            .as_deref()
            .map(str::parse::<chrono::DateTime<chrono::Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    let persisted = storage.get_persisted(run_id)?;
    let files_on_disk = persisted
        .iter()
        .map(|record| record.file_name.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;
    let failures = storage.get_failures(run_id)?;

    Ok(CrawlSummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash,
        papers_persisted: persisted.len() as u64,
        files_on_disk,
        papers_failed: failures.len() as u64,
        collisions: storage.get_file_collisions(run_id)?,
        failures,
    })
}

/// Generates a summary of the most recent run, if any
pub fn generate_latest_summary(storage: &dyn Storage) -> OutputResult<Option<CrawlSummary>> {
    match storage.get_latest_run()? {
        Some(run) => generate_summary(storage, run.id).map(Some),
        None => Ok(None),
    }
}
