//! Error types for the orchestrator.
//!
//! Two layers: `OrchestratorError` aborts a whole run before any task is
//! dispatched, `TaskError` is confined to a single unit and ends up as the
//! reason on its failed task.

use std::io;

use thiserror::Error;

use crate::media::MediaError;
use crate::scanner::ScanError;
use crate::sequencer::SequenceError;
use crate::state::StateError;
use crate::timeline::TimelineError;

/// Run-level error. Nothing is dispatched when one of these is returned.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Configuration that makes the run impossible (e.g. zero workers).
    #[error("Invalid orchestrator configuration: {0}")]
    InvalidConfig(String),

    /// The state store could not be opened or is corrupt.
    #[error("State store error: {0}")]
    State(#[from] StateError),

    /// Work-unit discovery failed.
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    /// A worker thread could not be started.
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

impl OrchestratorError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Error raised by a media operation for one unit.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Inputs required by the operation are absent or unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An external tool or probe failed.
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Ordered file list failed validation.
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// Timeline document could not be parsed, merged or written.
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// I/O failure with context.
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The operation panicked; the payload message is kept.
    #[error("Operation panicked: {0}")]
    Panicked(String),

    /// Completion could not be persisted.
    #[error("Failed to record completion: {0}")]
    Record(#[source] StateError),

    #[error("{0}")]
    Other(String),
}

impl TaskError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for run-level operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Result type for a single media operation.
pub type ExecResult<T> = Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_error_displays_context() {
        let err = TaskError::io(
            "copy subtitle",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("copy subtitle"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn sequence_error_converts() {
        let err: TaskError = SequenceError::MissingSequence(vec![3]).into();
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn invalid_config_message() {
        let err = OrchestratorError::invalid_config("max_workers must be at least 1");
        assert!(err.to_string().contains("max_workers"));
    }
}
