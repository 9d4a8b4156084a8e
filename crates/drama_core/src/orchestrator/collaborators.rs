//! Seams between the orchestrator and the outside world.
//!
//! The orchestrator never touches the filesystem layout or external tools
//! directly; it goes through these traits so tests can swap in fakes.

use std::path::{Path, PathBuf};

use super::errors::ExecResult;
use crate::media::MediaResult;
use crate::models::{OperationKind, WorkUnit};
use crate::scanner::ScanResult;

/// What a successful operation produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationOutput {
    /// Files written by the operation.
    pub output_paths: Vec<PathBuf>,
    /// Total media duration, when the operation measured it.
    pub duration_seconds: Option<f64>,
}

impl OperationOutput {
    /// Output with the given paths and no measured duration.
    pub fn new(output_paths: Vec<PathBuf>) -> Self {
        Self {
            output_paths,
            duration_seconds: None,
        }
    }

    /// Attach a measured duration.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

/// Executes one kind of media work for a unit.
///
/// Called concurrently from worker threads, once per unit.
pub trait MediaOperation: Send + Sync {
    /// Run the operation. Errors stay confined to this unit.
    fn execute(&self, unit: &WorkUnit, op: OperationKind) -> ExecResult<OperationOutput>;
}

/// Discovers work units and decides whether one has the inputs an
/// operation needs.
pub trait UnitScanner: Send + Sync {
    fn list_work_units(&self, root: &Path) -> ScanResult<Vec<WorkUnit>>;

    /// Structural check only. Must not touch media contents.
    fn validate(&self, unit: &WorkUnit, op: OperationKind) -> bool;
}

/// Reports the playback duration of a media file in seconds.
pub trait DurationProvider: Send + Sync {
    fn duration(&self, path: &Path) -> MediaResult<f64>;
}

/// Lookup table from operation kind to its implementation.
pub struct OperationSet {
    merge: Box<dyn MediaOperation>,
    separate: Box<dyn MediaOperation>,
    transcode: Box<dyn MediaOperation>,
}

impl OperationSet {
    pub fn new(
        merge: Box<dyn MediaOperation>,
        separate: Box<dyn MediaOperation>,
        transcode: Box<dyn MediaOperation>,
    ) -> Self {
        Self {
            merge,
            separate,
            transcode,
        }
    }

    /// Implementation registered for `op`.
    pub fn get(&self, op: OperationKind) -> &dyn MediaOperation {
        match op {
            OperationKind::Merge => self.merge.as_ref(),
            OperationKind::Separate => self.separate.as_ref(),
            OperationKind::Transcode => self.transcode.as_ref(),
        }
    }
}

impl MediaOperation for OperationSet {
    fn execute(&self, unit: &WorkUnit, op: OperationKind) -> ExecResult<OperationOutput> {
        self.get(op).execute(unit, op)
    }
}
