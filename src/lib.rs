//! Cite-Ripple: a polite citation graph crawler
//!
//! This crate expands a set of seed papers breadth-first through their
//! references and citations, fetching every newly discovered paper exactly
//! once from the Semantic Scholar API and writing one JSON file per paper.

pub mod config;
pub mod crawler;
pub mod output;
pub mod paper;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Cite-Ripple operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Seed resolution error: {0}")]
    Resolve(#[from] crawler::ResolveError),

    #[error("Record store error: {0}")]
    Store(#[from] state::StoreError),

    #[error("Persistence error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Cite-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use paper::{EdgeKind, PaperRecord, RelatedPaperStub};
pub use state::{PaperState, RecordStore};
