//! Configuration module for Cite-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use cite_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Output directory: {}", config.output.directory);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FailurePolicy, FetcherConfig, OutputConfig, SeedConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
