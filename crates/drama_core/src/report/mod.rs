//! Per-run summary reports.
//!
//! A report is built from the terminal tasks of one run and written as
//! pretty JSON into the report directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::files::unique_path;
use crate::models::{OperationKind, TaskStatus};
use crate::orchestrator::Task;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report '{}': {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read report '{}': {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedUnit {
    pub unit: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedUnit {
    pub unit: String,
    pub reason: String,
}

/// Outcome of one run.
///
/// `successful_units + failed_units + skipped_units == total_tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub operation: OperationKind,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub duration_seconds: f64,
    pub total_tasks: usize,
    pub successful_units: Vec<String>,
    pub failed_units: Vec<FailedUnit>,
    pub skipped_units: Vec<SkippedUnit>,
    /// Percentage of `total_tasks` that completed.
    pub success_rate: f64,
}

impl Report {
    /// Build from terminal tasks. A task that somehow is not terminal is
    /// reported as failed so the counts still add up.
    pub fn from_tasks(
        operation: OperationKind,
        start_time: DateTime<Local>,
        end_time: DateTime<Local>,
        tasks: &[Task],
    ) -> Self {
        let mut successful_units = Vec::new();
        let mut failed_units = Vec::new();
        let mut skipped_units = Vec::new();

        for task in tasks {
            let unit = task.unit_id().to_string();
            let reason = || task.reason.clone().unwrap_or_default();
            match task.status() {
                TaskStatus::Completed => successful_units.push(unit),
                TaskStatus::Failed => failed_units.push(FailedUnit {
                    unit,
                    error: reason(),
                }),
                TaskStatus::Skipped => skipped_units.push(SkippedUnit {
                    unit,
                    reason: reason(),
                }),
                status @ (TaskStatus::Pending | TaskStatus::InProgress) => {
                    failed_units.push(FailedUnit {
                        error: format!("{}: did not finish (still {})", unit, status),
                        unit,
                    })
                }
            }
        }

        let total_tasks = tasks.len();
        let success_rate = if total_tasks == 0 {
            0.0
        } else {
            successful_units.len() as f64 / total_tasks as f64 * 100.0
        };
        let duration_seconds = (end_time - start_time).num_milliseconds().max(0) as f64 / 1000.0;

        Self {
            operation,
            start_time,
            end_time,
            duration_seconds,
            total_tasks,
            successful_units,
            failed_units,
            skipped_units,
            success_rate,
        }
    }

    /// Whether every task completed.
    pub fn all_succeeded(&self) -> bool {
        self.successful_units.len() == self.total_tasks
    }

    /// `<op>_report_<YYYYmmdd_HHMMSS>.json`, from the end time.
    pub fn file_name(&self) -> String {
        format!(
            "{}_report_{}.json",
            self.operation,
            self.end_time.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write into `dir` (created if needed) and return the file path.
    pub fn save_to_dir(&self, dir: &Path) -> ReportResult<PathBuf> {
        fs::create_dir_all(dir).map_err(|source| ReportError::WriteError {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = unique_path(&dir.join(self.file_name()));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|source| ReportError::WriteError {
            path: path.clone(),
            source,
        })?;
        tracing::info!("Report written to {}", path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> ReportResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ReportError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Report: {}", self.operation)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Started:  {}", self.start_time.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Finished: {}", self.end_time.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Elapsed:  {:.2}s", self.duration_seconds)?;
        writeln!(f)?;
        writeln!(f, "Total:     {}", self.total_tasks)?;
        writeln!(f, "Succeeded: {}", self.successful_units.len())?;
        writeln!(f, "Failed:    {}", self.failed_units.len())?;
        writeln!(f, "Skipped:   {}", self.skipped_units.len())?;
        writeln!(f, "Success rate: {:.2}%", self.success_rate)?;

        if !self.failed_units.is_empty() {
            writeln!(f, "\nFailed:")?;
            for failed in &self.failed_units {
                writeln!(f, "  x {}", failed.unit)?;
                writeln!(f, "    {}", failed.error)?;
            }
        }
        if !self.skipped_units.is_empty() {
            writeln!(f, "\nSkipped:")?;
            for skipped in &self.skipped_units {
                writeln!(f, "  - {}", skipped.unit)?;
                writeln!(f, "    {}", skipped.reason)?;
            }
        }
        write!(f, "{}", rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Capabilities, WorkUnit};
    use chrono::Duration;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn task(id: &str, outcome: TaskStatus) -> Task {
        let unit = WorkUnit::new(id, format!("/d/{}", id), Capabilities::default());
        let mut task = Task::new(format!("merge-{}", id), unit, OperationKind::Merge);
        match outcome {
            TaskStatus::Completed => {
                task.start();
                task.complete(vec![], None);
            }
            TaskStatus::Failed => {
                task.start();
                task.fail(format!("{}: ffmpeg failed (exit code 1)", id));
            }
            TaskStatus::Skipped => {
                task.skip(format!("{}: merge already completed", id));
            }
            TaskStatus::InProgress => {
                task.start();
            }
            TaskStatus::Pending => {}
        }
        task
    }

    fn sample() -> Report {
        let start = Local::now();
        let tasks = vec![
            task("drama-0001", TaskStatus::Completed),
            task("drama-0002", TaskStatus::Failed),
            task("drama-0003", TaskStatus::Skipped),
            task("drama-0004", TaskStatus::Completed),
        ];
        Report::from_tasks(
            OperationKind::Merge,
            start,
            start + Duration::milliseconds(2500),
            &tasks,
        )
    }

    #[test]
    fn counts_and_rate() {
        let report = sample();
        assert_eq!(report.total_tasks, 4);
        assert_eq!(report.successful_units, vec!["drama-0001", "drama-0004"]);
        assert_eq!(report.failed_units.len(), 1);
        assert!(report.failed_units[0].error.contains("exit code 1"));
        assert_eq!(report.skipped_units[0].unit, "drama-0003");
        assert_eq!(report.success_rate, 50.0);
        assert_eq!(report.duration_seconds, 2.5);
        assert!(!report.all_succeeded());
    }

    #[test]
    fn empty_run() {
        let now = Local::now();
        let report = Report::from_tasks(OperationKind::Transcode, now, now, &[]);
        assert_eq!(report.total_tasks, 0);
        assert_eq!(report.success_rate, 0.0);
        assert!(report.all_succeeded());
    }

    #[test]
    fn unfinished_task_counts_as_failed() {
        let now = Local::now();
        let tasks = vec![task("drama-0009", TaskStatus::InProgress)];
        let report = Report::from_tasks(OperationKind::Separate, now, now, &tasks);
        assert_eq!(report.failed_units.len(), 1);
        assert!(report.failed_units[0].error.contains("did not finish"));
    }

    #[test]
    fn json_round_trip_keeps_pairs() {
        let report = sample();
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_tasks, report.total_tasks);
        assert_eq!(back.failed_units, report.failed_units);
        assert_eq!(back.skipped_units, report.skipped_units);
        assert_eq!(back.successful_units, report.successful_units);
    }

    #[test]
    fn json_uses_documented_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["operation"], "merge");
        assert_eq!(value["failed_units"][0]["unit"], "drama-0002");
        assert!(value["skipped_units"][0]["reason"].is_string());
        assert!(value["start_time"].is_string());
    }

    #[test]
    fn saves_with_timestamped_name() {
        let dir = tempdir().unwrap();
        let report = sample();
        let path = report.save_to_dir(&dir.path().join("reports")).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let pattern = regex::Regex::new(r"^merge_report_\d{8}_\d{6}\.json$").unwrap();
        assert!(pattern.is_match(&name), "{}", name);

        let loaded = Report::load(&path).unwrap();
        assert_eq!(loaded.failed_units, report.failed_units);

        let second = report.save_to_dir(&dir.path().join("reports")).unwrap();
        assert_ne!(second, path);
    }

    #[test]
    fn summary_lists_failures_and_skips() {
        let text = sample().to_string();
        assert!(text.contains("Report: merge"));
        assert!(text.contains("Success rate: 50.00%"));
        assert!(text.contains("x drama-0002"));
        assert!(text.contains("- drama-0003"));
    }

    proptest! {
        #[test]
        fn outcome_counts_sum_to_total(outcomes in prop::collection::vec(0u8..3, 0..40)) {
            let tasks: Vec<Task> = outcomes
                .iter()
                .enumerate()
                .map(|(i, o)| {
                    let status = match o {
                        0 => TaskStatus::Completed,
                        1 => TaskStatus::Failed,
                        _ => TaskStatus::Skipped,
                    };
                    task(&format!("drama-{:04}", i), status)
                })
                .collect();
            let now = Local::now();
            let report = Report::from_tasks(OperationKind::Merge, now, now, &tasks);
            prop_assert_eq!(
                report.successful_units.len() + report.failed_units.len() + report.skipped_units.len(),
                report.total_tasks
            );
            prop_assert_eq!(report.total_tasks, outcomes.len());
        }
    }
}
