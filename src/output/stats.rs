//! Statistics of the latest run, read from the ledger
//!
//! Backs the `--stats` flag of the command line.

use crate::storage::{FileCollision, RunRecord, Storage};
use crate::RippleError;

/// Statistics of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub run: RunRecord,

    /// Records written to the output directory
    pub papers_persisted: u64,

    /// Papers whose fetch failed for good
    pub papers_failed: u64,

    /// Failure counts per error kind (`network`, `timeout`, `status`,
    /// `decode`), most frequent first
    pub failures_by_kind: Vec<(String, u64)>,

    pub collisions: Vec<FileCollision>,
}

/// Loads statistics of the most recent run
///
/// # Returns
///
/// * `Ok(Some(stats))` - The ledger holds at least one run
/// * `Ok(None)` - The ledger is empty
/// * `Err(RippleError)` - Failed to query the ledger
pub fn load_statistics(storage: &dyn Storage) -> Result<Option<CrawlStatistics>, RippleError> {
    let Some(run) = storage.get_latest_run()? else {
        return Ok(None);
    };

    let papers_persisted = storage.count_persisted(run.id)?;
    let failures = storage.get_failures(run.id)?;
    let collisions = storage.get_file_collisions(run.id)?;

    let mut failures_by_kind: Vec<(String, u64)> = Vec::new();
    for failure in &failures {
        match failures_by_kind
            .iter_mut()
            .find(|(kind, _)| *kind == failure.kind)
        {
            Some((_, count)) => *count += 1,
            None => failures_by_kind.push((failure.kind.clone(), 1)),
        }
    }
    failures_by_kind.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(Some(CrawlStatistics {
        run,
        papers_persisted,
        papers_failed: failures.len() as u64,
        failures_by_kind,
        collisions,
    }))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run {} ({}):", stats.run.id, stats.run.status.to_db_string());
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!();

    println!("Papers:");
    println!("  Written: {}", stats.papers_persisted);
    println!("  Failed: {}", stats.papers_failed);
    println!();

    if !stats.failures_by_kind.is_empty() {
        println!("Failures by Kind:");
        for (kind, count) in &stats.failures_by_kind {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if !stats.collisions.is_empty() {
        println!("Filename Collisions ({}):", stats.collisions.len());
        for collision in &stats.collisions {
            println!(
                "  {} <- {}",
                collision.file_name,
                collision.paper_ids.join(", ")
            );
        }
        println!();
    }

    let attempted = stats.papers_persisted + stats.papers_failed;
    let success_rate = if attempted > 0 {
        (stats.papers_persisted as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} papers fetched)",
        success_rate, stats.papers_persisted, attempted
    );
}
