//! Task lifecycle, progress and cancellation types.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{OperationKind, TaskStatus, WorkUnit};

/// One (unit, operation) pair and its lifecycle.
///
/// Status only moves forward: `Pending -> InProgress -> Completed | Failed`,
/// or `Pending -> Skipped`. Transition methods return `false` and leave the
/// task untouched when asked to make any other move.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub unit: WorkUnit,
    pub operation: OperationKind,
    status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure or skip reason. Names the unit.
    pub reason: Option<String>,
    pub output_paths: Vec<PathBuf>,
    pub duration_seconds: Option<f64>,
}

impl Task {
    pub fn new(id: impl Into<String>, unit: WorkUnit, operation: OperationKind) -> Self {
        Self {
            id: id.into(),
            unit,
            operation,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            reason: None,
            output_paths: Vec::new(),
            duration_seconds: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn unit_id(&self) -> &str {
        self.unit.id()
    }

    /// Wall time between start and completion, if both happened.
    pub fn elapsed_seconds(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }

    /// `Pending -> InProgress`.
    pub fn start(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::InProgress;
        self.started_at = Some(Utc::now());
        true
    }

    /// `InProgress -> Completed`.
    pub fn complete(&mut self, output_paths: Vec<PathBuf>, duration_seconds: Option<f64>) -> bool {
        if self.status != TaskStatus::InProgress {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.output_paths = output_paths;
        self.duration_seconds = duration_seconds;
        true
    }

    /// `InProgress -> Failed`.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.status != TaskStatus::InProgress {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.reason = Some(reason.into());
        true
    }

    /// `Pending -> Skipped`.
    pub fn skip(&mut self, reason: impl Into<String>) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Skipped;
        self.completed_at = Some(Utc::now());
        self.reason = Some(reason.into());
        true
    }
}

/// A task reached a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub task_id: String,
    pub unit_id: String,
    pub status: TaskStatus,
}

impl ProgressEvent {
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            unit_id: task.unit_id().to_string(),
            status: task.status(),
        }
    }
}

/// Aggregate progress after an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub current: usize,
    pub total: usize,
    /// Always within `[0, 100]`.
    pub percentage: f64,
}

impl ProgressSnapshot {
    pub fn new(current: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            (current as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        };
        Self {
            current,
            total,
            percentage,
        }
    }
}

/// Progress callback, invoked from the aggregating thread only.
pub type ProgressCallback = Box<dyn Fn(&ProgressEvent, ProgressSnapshot) + Send + Sync>;

/// Handle for cancelling a running batch.
///
/// Tasks already executing finish; tasks not yet picked up are skipped.
#[derive(Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Capabilities;

    fn task() -> Task {
        let unit = WorkUnit::new("drama-0001", "/d/drama-0001", Capabilities::default());
        Task::new("merge-1", unit, OperationKind::Merge)
    }

    #[test]
    fn forward_transitions() {
        let mut t = task();
        assert_eq!(t.status(), TaskStatus::Pending);
        assert!(t.start());
        assert!(t.complete(vec![PathBuf::from("/out.mp4")], Some(3.0)));
        assert_eq!(t.status(), TaskStatus::Completed);
        assert!(t.elapsed_seconds().is_some());
    }

    #[test]
    fn terminal_states_are_sinks() {
        let mut t = task();
        assert!(t.skip("already completed"));
        assert!(!t.start());
        assert!(!t.fail("late"));
        assert_eq!(t.status(), TaskStatus::Skipped);
        assert_eq!(t.reason.as_deref(), Some("already completed"));

        let mut t = task();
        t.start();
        t.fail("boom");
        assert!(!t.complete(vec![], None));
        assert!(!t.skip("x"));
        assert_eq!(t.status(), TaskStatus::Failed);
    }

    #[test]
    fn pending_cannot_complete_directly() {
        let mut t = task();
        assert!(!t.complete(vec![], None));
        assert!(!t.fail("x"));
        assert_eq!(t.status(), TaskStatus::Pending);
    }

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(ProgressSnapshot::new(0, 4).percentage, 0.0);
        assert_eq!(ProgressSnapshot::new(2, 4).percentage, 50.0);
        assert_eq!(ProgressSnapshot::new(9, 4).percentage, 100.0);
        assert_eq!(ProgressSnapshot::new(0, 0).percentage, 100.0);
    }

    #[test]
    fn cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
    }
}
