//! JSON persistence sink
//!
//! Each record is written to `<directory>/<slug(title)>.json`, pretty-printed
//! with sorted keys and four-space indentation so repeated crawls diff
//! cleanly. Writes fully overwrite any existing file at that path.
//!
//! Two papers whose titles share the same 50-character slug map to the same
//! file; the later write wins. The sink reports such collisions instead of
//! preventing them.

use crate::paper::{file_name_for, PaperRecord};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors that can occur while persisting a record
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// What happened to a record handed to [`JsonSink::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was written
    Written {
        path: PathBuf,
        /// Id of a different paper previously written to the same file
        collided_with: Option<String>,
    },

    /// The record has no usable title, so no filename could be derived
    Untitled,
}

/// Writes one JSON file per paper into a directory
#[derive(Debug)]
pub struct JsonSink {
    directory: PathBuf,
    /// file name -> id of the paper last written there
    written: Mutex<HashMap<String, String>>,
}

impl JsonSink {
    /// Creates a sink writing into `directory`, creating it if needed
    pub fn new(directory: impl Into<PathBuf>) -> SinkResult<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(|source| SinkError::Io {
            path: directory.clone(),
            source,
        })?;

        Ok(Self {
            directory,
            written: Mutex::new(HashMap::new()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the path a record would be written to
    pub fn path_for(&self, record: &PaperRecord) -> Option<PathBuf> {
        let title = record.title.as_deref()?;
        file_name_for(title).map(|name| self.directory.join(name))
    }

    /// Persists `record`, overwriting any file already at its path
    ///
    /// The write is flushed to disk before returning. It is not atomic: a
    /// crash mid-write can leave a truncated file.
    pub fn save(&self, record: &PaperRecord) -> SinkResult<SaveOutcome> {
        let Some(path) = self.path_for(record) else {
            return Ok(SaveOutcome::Untitled);
        };

        let bytes = to_pretty_json(record)?;
        write_file(&path, &bytes)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let previous = self
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_name, record.id.clone());

        let collided_with = previous.filter(|prev| *prev != record.id);

        Ok(SaveOutcome::Written {
            path,
            collided_with,
        })
    }

    /// Number of distinct files written by this sink
    pub fn files_written(&self) -> usize {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Serializes a record with sorted keys and four-space indentation
pub fn to_pretty_json(record: &PaperRecord) -> SinkResult<Vec<u8>> {
    // Going through `Value` sorts object keys at every level.
    let value = serde_json::to_value(record)?;

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;

    Ok(buf)
}

fn write_file(path: &Path, bytes: &[u8]) -> SinkResult<()> {
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    Ok(())
}
