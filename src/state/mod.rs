//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RecordStore`: paper id -> record map, doubling as the single-fetch gate
//! - `VisitedSet`: ids whose references and citations have been expanded
//! - `PaperState`: what the record store holds for an id

mod paper_state;
mod record_store;
mod visited;

// Re-export main types
pub use paper_state::PaperState;
pub use record_store::{RecordStore, Slot, StoreError, StoreResult};
pub use visited::VisitedSet;
