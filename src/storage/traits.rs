//! Storage traits and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use crate::storage::{FailureRecord, FileCollision, PersistedRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for run ledger backends
///
/// The crawl engine owns its ledger and calls it from a single task, so
/// implementations need to be `Send` but not `Sync`.
pub trait Storage: Send {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed)
    }

    // ===== Paper Records =====

    /// Records that a paper was written to `file_name`
    fn record_persisted(
        &mut self,
        run_id: i64,
        paper_id: &str,
        title: Option<&str>,
        file_name: &str,
    ) -> StorageResult<()>;

    /// Records that a paper could not be fetched
    ///
    /// `kind` is the error's class (`network`, `timeout`, `status`, `decode`),
    /// `error` its full message.
    fn record_failure(
        &mut self,
        run_id: i64,
        paper_id: &str,
        kind: &str,
        error: &str,
    ) -> StorageResult<()>;

    /// Counts the records written during a run
    fn count_persisted(&self, run_id: i64) -> StorageResult<u64>;

    /// Gets the records written during a run, in write order
    fn get_persisted(&self, run_id: i64) -> StorageResult<Vec<PersistedRecord>>;

    /// Counts the failed papers of a run
    fn count_failures(&self, run_id: i64) -> StorageResult<u64>;

    /// Gets the failed papers of a run, oldest first
    fn get_failures(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>>;

    /// Gets the files of a run that more than one paper was written to
    fn get_file_collisions(&self, run_id: i64) -> StorageResult<Vec<FileCollision>>;
}
