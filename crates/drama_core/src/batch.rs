//! One-call batch runs driven by [`Settings`].
//!
//! Wires the state store, directory scanner and media operations together,
//! runs the orchestrator and turns the results into a [`Report`].

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use thiserror::Error;

use crate::config::{ConfigError, Settings};
use crate::media::{
    FfprobeDuration, LogTarget, MergeOperation, SeparateOperation, TranscodeOperation,
};
use crate::models::OperationKind;
use crate::orchestrator::{
    CancelHandle, DurationProvider, OperationSet, OrchestratorError, ProgressCallback, Task,
    TaskOrchestrator,
};
use crate::report::Report;
use crate::scanner::DirectoryScanner;
use crate::state::StateStore;

/// Errors that stop a batch before any unit runs.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

pub type BatchResult<T> = Result<T, BatchError>;

/// What a finished batch produced.
#[derive(Debug)]
pub struct BatchOutcome {
    pub report: Report,
    /// Set when the report was written to disk.
    pub report_path: Option<PathBuf>,
    /// One terminal task per unit, sorted by unit id.
    pub tasks: Vec<Task>,
}

pub struct BatchRunner {
    settings: Settings,
    cancel: CancelHandle,
    progress_callback: Option<ProgressCallback>,
}

impl BatchRunner {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cancel: CancelHandle::new(),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Cancelling stops dispatch for the run in progress.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run `op` over every unit under the configured root.
    pub fn run(&mut self, op: OperationKind) -> BatchResult<BatchOutcome> {
        self.settings.validate()?;
        let paths = &self.settings.paths;
        if paths.drama_root.trim().is_empty() {
            return Err(ConfigError::invalid("paths.drama_root is not set").into());
        }

        let root = paths.root();
        let store = StateStore::open(paths.state_path()).map_err(OrchestratorError::from)?;
        let scanner = DirectoryScanner::new();
        let operations = self.operation_set();

        let start_time = Local::now();
        tracing::info!(
            "Starting {} under {} ({} workers, resume {})",
            op,
            root.display(),
            self.settings.orchestration.max_workers,
            if self.settings.orchestration.enable_resume { "on" } else { "off" }
        );

        let mut orchestrator = TaskOrchestrator::new(
            &store,
            &scanner,
            &operations,
            self.settings.orchestration.max_workers,
        )?
        .with_resume(self.settings.orchestration.enable_resume)
        .with_cancel_handle(self.cancel.clone());
        if let Some(callback) = self.progress_callback.take() {
            orchestrator = orchestrator.with_progress_callback(callback);
        }

        let result = orchestrator.run_root(&root, op);
        // Hand the callback back so the runner can be reused.
        self.progress_callback = orchestrator.take_progress_callback();
        let tasks = result?;

        let report = Report::from_tasks(op, start_time, Local::now(), &tasks);
        tracing::info!(
            "{} success rate {:.1}% over {} units in {:.2}s",
            op,
            report.success_rate,
            report.total_tasks,
            report.duration_seconds
        );

        let report_path = if self.settings.orchestration.generate_report {
            // The units already ran; a report that cannot be written is not
            // worth failing the batch over.
            match report.save_to_dir(&paths.report_path()) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Could not save report: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(BatchOutcome {
            report,
            report_path,
            tasks,
        })
    }

    fn operation_set(&self) -> OperationSet {
        let media = &self.settings.media;
        let durations: Arc<dyn DurationProvider> = Arc::new(FfprobeDuration);
        let log_target = LogTarget::new(
            self.settings.paths.logs_path(),
            self.settings.logging.log_config(),
        );

        OperationSet::new(
            Box::new(MergeOperation::new(durations.clone()).with_log_target(log_target.clone())),
            Box::new(
                SeparateOperation::new(durations)
                    .with_model(media.separator_model.clone())
                    .with_accompaniment_volume(media.accompaniment_volume)
                    .with_log_target(log_target.clone()),
            ),
            Box::new(
                TranscodeOperation::new(media.transcode_specs.clone())
                    .with_preset(media.preset.clone())
                    .with_log_target(log_target),
            ),
        )
    }
}
