//! Record store and single-fetch gate
//!
//! The store maps paper ids to their records. Its `put_if_absent` is the only
//! place an id can be admitted to the crawl, so an id admitted once is never
//! fetched again no matter how many papers point at it.

use crate::paper::PaperRecord;
use crate::state::PaperState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during record store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Paper not found: {0}")]
    NotFound(String),

    #[error("Paper {id} has no record (state: {state})")]
    NotReady { id: String, state: PaperState },

    #[error("Paper {id} cannot be updated (state: {state})")]
    NotPending { id: String, state: PaperState },
}

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// What the store holds for one id
#[derive(Debug, Clone)]
pub enum Slot {
    /// Placeholder inserted by the gate while the fetch is in flight
    Pending,

    /// Full record
    Stored(Arc<PaperRecord>),

    /// Fetch failed for good, with the reason
    Failed(String),
}

impl Slot {
    pub fn state(&self) -> PaperState {
        match self {
            Self::Pending => PaperState::Pending,
            Self::Stored(_) => PaperState::Stored,
            Self::Failed(_) => PaperState::Failed,
        }
    }
}

/// Paper id -> record map shared by every crawl component
///
/// Cloning is cheap and yields a handle to the same map. All operations are
/// atomic per id, so concurrent callers still see one admission per id.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    entries: Arc<DashMap<String, Slot>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id was ever admitted, whatever its state
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the stored record for `id`
    ///
    /// # Returns
    ///
    /// * `Ok(record)` - The id holds a full record
    /// * `Err(StoreError::NotFound)` - The id was never admitted
    /// * `Err(StoreError::NotReady)` - The id is pending or failed
    pub fn get(&self, id: &str) -> StoreResult<Arc<PaperRecord>> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match entry.value() {
            Slot::Stored(record) => Ok(Arc::clone(record)),
            other => Err(StoreError::NotReady {
                id: id.to_string(),
                state: other.state(),
            }),
        }
    }

    /// Inserts `slot` under `id` unless the id is already known
    ///
    /// This is the single-fetch gate: it returns true for exactly one caller
    /// per id over the lifetime of the store.
    pub fn put_if_absent(&self, id: &str, slot: Slot) -> bool {
        match self.entries.entry(id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                true
            }
        }
    }

    /// Admits a complete record (a seed) through the gate, keyed by its own id
    pub fn put_record_if_absent(&self, record: PaperRecord) -> bool {
        let id = record.id.clone();
        self.put_if_absent(&id, Slot::Stored(Arc::new(record)))
    }

    /// Replaces the pending placeholder of `id` with its fetched record
    ///
    /// Stored records are never overwritten.
    pub fn fulfill(&self, id: &str, record: PaperRecord) -> StoreResult<Arc<PaperRecord>> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match entry.value() {
            Slot::Pending => {
                let record = Arc::new(record);
                *entry.value_mut() = Slot::Stored(Arc::clone(&record));
                Ok(record)
            }
            other => Err(StoreError::NotPending {
                id: id.to_string(),
                state: other.state(),
            }),
        }
    }

    /// Marks the pending placeholder of `id` as failed
    pub fn mark_failed(&self, id: &str, reason: impl Into<String>) -> StoreResult<()> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match entry.value() {
            Slot::Pending => {
                *entry.value_mut() = Slot::Failed(reason.into());
                Ok(())
            }
            other => Err(StoreError::NotPending {
                id: id.to_string(),
                state: other.state(),
            }),
        }
    }

    /// Returns the state of `id`, if it was admitted
    pub fn state(&self, id: &str) -> Option<PaperState> {
        self.entries.get(id).map(|entry| entry.value().state())
    }

    /// Returns the failure reason recorded for `id`
    pub fn failure_reason(&self, id: &str) -> Option<String> {
        self.entries.get(id).and_then(|entry| match entry.value() {
            Slot::Failed(reason) => Some(reason.clone()),
            _ => None,
        })
    }

    /// Number of admitted ids
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of ids currently in `state`
    pub fn count(&self, state: PaperState) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().state() == state)
            .count()
    }

    /// Snapshot of every stored record, in no particular order
    pub fn records(&self) -> Vec<Arc<PaperRecord>> {
        self.entries
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Stored(record) => Some(Arc::clone(record)),
                _ => None,
            })
            .collect()
    }
}
