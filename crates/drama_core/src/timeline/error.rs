//! Timeline error types.

use std::path::PathBuf;

use super::types::TimelineFormat;

/// Errors that can occur during timeline operations.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// Failed to read a timeline file.
    #[error("Failed to read file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a timeline file.
    #[error("Failed to write file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Unknown or unsupported format.
    #[error("Unknown timeline format for file '{0}'")]
    UnknownFormat(PathBuf),

    /// Parse error.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// Documents in one merge do not share a format.
    #[error("Format mismatch in {document}: expected {expected}, found {found}")]
    FormatMismatch {
        document: String,
        expected: TimelineFormat,
        found: TimelineFormat,
    },

    /// A source document is not internally ordered.
    #[error("Malformed timeline in {document} at entry {entry}: {message}")]
    MalformedTimeline {
        document: String,
        entry: usize,
        message: String,
    },

    /// Durations list does not match documents list.
    #[error("Got {documents} documents but {durations} durations")]
    DurationCountMismatch { documents: usize, durations: usize },

    /// A duration is negative or not finite.
    #[error("Invalid duration {value} for {document}")]
    InvalidDuration { document: String, value: f64 },

    /// Nothing to merge.
    #[error("No documents to merge")]
    NoDocuments,
}

/// Errors that can occur during timeline parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Invalid or malformed time format.
    #[error("Invalid time format at line {line}: '{value}'")]
    InvalidTime { line: usize, value: String },

    /// Invalid event/dialogue line.
    #[error("Invalid event at line {line}: {message}")]
    InvalidEvent { line: usize, message: String },
}

/// Result type for timeline operations.
pub type TimelineResult<T> = Result<T, TimelineError>;

impl TimelineError {
    /// Create a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed timeline error.
    pub fn malformed(document: impl Into<String>, entry: usize, message: impl Into<String>) -> Self {
        Self::MalformedTimeline {
            document: document.into(),
            entry,
            message: message.into(),
        }
    }
}

impl ParseError {
    /// Create an invalid time error.
    pub fn invalid_time(line: usize, value: impl Into<String>) -> Self {
        Self::InvalidTime {
            line,
            value: value.into(),
        }
    }

    /// Create an invalid event error.
    pub fn invalid_event(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            line,
            message: message.into(),
        }
    }
}
