//! State record types and errors.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TaskStatus;

/// Durable outcome of one (unit, operation) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub status: TaskStatus,
    /// RFC 3339 time the record was written.
    pub timestamp: String,
    /// Declared outputs. Empty for failures.
    #[serde(default)]
    pub output_paths: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StateRecord {
    /// A completed record stamped with the current time.
    pub fn completed(output_paths: Vec<PathBuf>) -> Self {
        Self {
            status: TaskStatus::Completed,
            timestamp: chrono::Local::now().to_rfc3339(),
            output_paths,
            error: None,
        }
    }

    /// A failed record stamped with the current time.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            timestamp: chrono::Local::now().to_rfc3339(),
            output_paths: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Result of checking a record against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Recorded as completed and every output exists.
    Completed,
    /// Recorded as completed, but these outputs are gone.
    OutputsMissing(Vec<PathBuf>),
    /// No record, or a record that is not completed.
    NotCompleted,
}

/// Record counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Records in any other status.
    pub other: usize,
}

/// Errors from the state store.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file exists but cannot be parsed.
    #[error("State file '{path}' is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The state file exists but cannot be read.
    #[error("Failed to read state file '{path}': {source}")]
    ReadError { path: PathBuf, source: io::Error },

    /// Writing the state file failed. The store keeps its previous contents.
    #[error("Failed to write state file '{path}': {source}")]
    WriteError { path: PathBuf, source: io::Error },

    #[error("Failed to serialize state: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;
