//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// The processing stage a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Concatenate video segments and merge their subtitles.
    Merge,
    /// Strip vocals from the merged video's audio.
    Separate,
    /// Re-encode the cleared video at each target resolution.
    Transcode,
}

impl OperationKind {
    /// All operations in pipeline order.
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Merge,
        OperationKind::Separate,
        OperationKind::Transcode,
    ];

    /// Stable name used in state keys and report file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Merge => "merge",
            OperationKind::Separate => "separate",
            OperationKind::Transcode => "transcode",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Ok(OperationKind::Merge),
            "separate" | "separation" => Ok(OperationKind::Separate),
            "transcode" => Ok(OperationKind::Transcode),
            _ => Err(format!(
                "unknown operation: '{s}' (expected: merge, separate, transcode)"
            )),
        }
    }
}

/// Lifecycle state of a task.
///
/// `Pending -> InProgress -> {Completed, Failed}`, or `Pending -> Skipped`.
/// The last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl TaskStatus {
    /// Whether no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
