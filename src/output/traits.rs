//! Summary types for finished crawl runs
//!
//! This module defines the data structure a run summary is rendered from
//! and the error type of the output layer.

use crate::storage::{FailureRecord, FileCollision};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of one crawl run, read back from the ledger
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Counts
    pub papers_persisted: u64,
    pub files_on_disk: u64,
    pub papers_failed: u64,

    /// Files more than one paper was written to
    pub collisions: Vec<FileCollision>,

    /// Papers whose fetch failed for good
    pub failures: Vec<FailureRecord>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Papers whose file was later overwritten by another paper
    pub fn papers_overwritten(&self) -> u64 {
        self.collisions
            .iter()
            .map(|c| c.paper_ids.len().saturating_sub(1) as u64)
            .sum()
    }

    /// Returns the share of attempted papers that were fetched, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.papers_persisted + self.papers_failed;
        if attempted == 0 {
            return 0.0;
        }
        (self.papers_persisted as f64 / attempted as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_summary_new() {
        let summary = CrawlSummary::new();
        assert_eq!(summary.papers_persisted, 0);
        assert_eq!(summary.papers_overwritten(), 0);
    }

    #[test]
    fn test_papers_overwritten() {
        let mut summary = CrawlSummary::new();
        summary.collisions = vec![
            FileCollision {
                file_name: "a.json".to_string(),
                paper_ids: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            },
            FileCollision {
                file_name: "b.json".to_string(),
                paper_ids: vec!["4".to_string(), "5".to_string()],
            },
        ];
        assert_eq!(summary.papers_overwritten(), 3);
    }

    #[test]
    fn test_success_rate() {
        let mut summary = CrawlSummary::new();
        summary.papers_persisted = 80;
        summary.papers_failed = 20;

        let rate = summary.success_rate();
        assert!((rate - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_papers() {
        let summary = CrawlSummary::new();
        assert_eq!(summary.success_rate(), 0.0);
    }
}
