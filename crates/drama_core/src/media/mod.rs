//! Media operations backed by external tools.
//!
//! Each operation works on one unit directory:
//!
//! ```text
//! drama-0001/
//!     original/video/*.mp4   ──merge──►     merged/merged.mp4 (+ merged.srt)
//!     original/srt/*.srt
//!     merged/                ──separate──►  cleared/merged.mp4
//!     cleared/               ──transcode──► encoded/merged_720p.mp4 ...
//! ```

pub mod ffmpeg;
pub mod files;
mod merge;
mod separate;
mod transcode;

pub use ffmpeg::{probe_resolution, FfprobeDuration};
pub use merge::MergeOperation;
pub use separate::{SeparateOperation, DEFAULT_SEPARATOR_MODEL};
pub use transcode::{TranscodeOperation, TranscodeSpec, DEFAULT_PRESET};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::logging::{LogConfig, UnitLogger};
use crate::models::{OperationKind, WorkUnit};
use crate::orchestrator::{ExecResult, OperationOutput};

/// Errors from external tools and media file handling.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The tool binary could not be started at all.
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed (exit code {exit_code}): {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Probe output was unusable for this file.
    #[error("Probe failed for '{}': {message}", path.display())]
    ProbeFailed { path: PathBuf, message: String },

    /// The tool claimed success but an expected file is absent.
    #[error("Expected output missing: {}", .0.display())]
    OutputMissing(PathBuf),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MediaError {
    pub fn spawn(tool: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            tool: tool.into(),
            source,
        }
    }

    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn probe_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for media helpers.
pub type MediaResult<T> = Result<T, MediaError>;

/// Where per-unit log files go.
#[derive(Debug, Clone)]
pub struct LogTarget {
    pub dir: PathBuf,
    pub config: LogConfig,
}

impl LogTarget {
    pub fn new(dir: impl Into<PathBuf>, config: LogConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
        }
    }

    /// Open the log for one unit. A log that cannot be created is not an
    /// error for the unit; it just runs without one.
    pub fn open(&self, unit_id: &str, op: OperationKind) -> Option<UnitLogger> {
        match UnitLogger::new(unit_id, op.as_str(), &self.dir, self.config.clone()) {
            Ok(logger) => Some(logger),
            Err(e) => {
                tracing::warn!(
                    "[{}] Could not open unit log in {}: {}",
                    unit_id,
                    self.dir.display(),
                    e
                );
                None
            }
        }
    }
}

/// Run `body` with the unit's log open (when configured), recording the
/// outcome in it.
fn with_unit_log<F>(
    target: Option<&LogTarget>,
    unit: &WorkUnit,
    op: OperationKind,
    body: F,
) -> ExecResult<OperationOutput>
where
    F: FnOnce(Option<&UnitLogger>) -> ExecResult<OperationOutput>,
{
    let logger = target.and_then(|t| t.open(unit.id(), op));
    if let Some(ref logger) = logger {
        logger.phase(&format!("{} {}", op, unit.id()));
    }

    let result = body(logger.as_ref());

    if let Some(ref logger) = logger {
        match &result {
            Ok(output) => logger.success(&format!("{} outputs", output.output_paths.len())),
            Err(e) => logger.error(&e.to_string()),
        }
    }
    result
}
