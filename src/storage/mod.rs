//! Storage module for the crawl run ledger
//!
//! The ledger is an optional SQLite database recording, per crawl run:
//! - When the run started and how it ended
//! - Every record written to the output directory, with its file name
//! - Every paper whose fetch failed for good
//!
//! It is what lets filename collisions and failures be inspected after the
//! fact, since the output directory alone cannot show them.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::RippleError;
use std::path::Path;

/// Initializes or opens a ledger database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> Result<SqliteStorage, RippleError> {
    SqliteStorage::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// A record written to disk during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub paper_id: String,
    pub title: Option<String>,
    pub file_name: String,
    pub run_id: i64,
}

/// A paper whose fetch failed during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub paper_id: String,
    pub run_id: i64,
    pub kind: String,
    pub error: String,
    pub failed_at: String,
}

/// Several papers of one run written to the same file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCollision {
    pub file_name: String,
    /// Paper ids in write order; only the last one survives on disk
    pub paper_ids: Vec<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
