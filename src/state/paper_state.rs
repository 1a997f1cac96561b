/// Slot states of the record store
///
/// Every identifier admitted through the single-fetch gate is in exactly one
/// of these states for the rest of the crawl.
use std::fmt;

/// Represents what the record store holds for a paper id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperState {
    /// Id claimed through the gate, fetch not finished yet
    Pending,

    /// Full record available (seed or successful fetch)
    Stored,

    /// Fetch gave up; the id is never fetched again in this crawl
    Failed,
}

impl PaperState {
    /// Returns true if this state can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if a full record can be read for this id
    pub fn has_record(&self) -> bool {
        matches!(self, Self::Stored)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Stored => "stored",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
