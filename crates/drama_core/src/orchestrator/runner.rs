//! Bounded worker pool that runs one operation across many units.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::collaborators::{MediaOperation, UnitScanner};
use super::errors::{OrchestratorError, OrchestratorResult, TaskError};
use super::types::{CancelHandle, ProgressCallback, ProgressEvent, ProgressSnapshot, Task};
use crate::models::{OperationKind, TaskStatus, WorkUnit};
use crate::state::{Completion, StateStore};

/// Runs one operation kind over a set of units with at most
/// `max_workers` executing at once.
///
/// Admission (structural validation, then the resume check) happens on the
/// calling thread. Workers pull admitted tasks from a shared queue, execute
/// them, persist the outcome to the state store and hand the finished task
/// back to the calling thread, which is the only place progress is counted.
pub struct TaskOrchestrator<'a> {
    store: &'a StateStore,
    scanner: &'a dyn UnitScanner,
    operations: &'a dyn MediaOperation,
    max_workers: usize,
    resume: bool,
    cancel: CancelHandle,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> TaskOrchestrator<'a> {
    pub fn new(
        store: &'a StateStore,
        scanner: &'a dyn UnitScanner,
        operations: &'a dyn MediaOperation,
        max_workers: usize,
    ) -> OrchestratorResult<Self> {
        if max_workers == 0 {
            return Err(OrchestratorError::invalid_config(
                "max_workers must be at least 1",
            ));
        }
        Ok(Self {
            store,
            scanner,
            operations,
            max_workers,
            resume: true,
            cancel: CancelHandle::new(),
            progress_callback: None,
        })
    }

    /// Skip units already recorded as completed (default on).
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn take_progress_callback(&mut self) -> Option<ProgressCallback> {
        self.progress_callback.take()
    }

    /// Share a cancel handle owned by the caller.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that stops dispatch of not-yet-started tasks.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Discover units under `root` and run `op` over them.
    pub fn run_root(&self, root: &Path, op: OperationKind) -> OrchestratorResult<Vec<Task>> {
        let units = self.scanner.list_work_units(root)?;
        self.run(&units, op)
    }

    /// Run `op` over `units`. Returns exactly one terminal task per unit.
    pub fn run(&self, units: &[WorkUnit], op: OperationKind) -> OrchestratorResult<Vec<Task>> {
        let total = units.len();
        let mut aggregator = ProgressAggregator::new(total, self.progress_callback.as_ref());
        let mut results = Vec::with_capacity(total);
        let mut pending = Vec::new();

        for (i, unit) in units.iter().enumerate() {
            let mut task = Task::new(format!("{}-{}", op, i + 1), unit.clone(), op);
            match self.skip_reason(unit, op) {
                Some(reason) => {
                    tracing::info!("[{}] Skipping {}: {}", unit.id(), op, reason);
                    task.skip(reason);
                    aggregator.record(&task);
                    results.push(task);
                }
                None => pending.push(task),
            }
        }

        if pending.is_empty() {
            tracing::info!("{}: nothing to dispatch ({} units)", op, total);
        } else {
            self.dispatch(op, total, pending, &mut aggregator, &mut results)?;
        }

        debug_assert_eq!(results.len(), total);
        results.sort_by(|a, b| a.unit_id().cmp(b.unit_id()));
        log_summary(op, &results);
        Ok(results)
    }

    /// Feed `pending` through the worker pool, collecting finished tasks.
    fn dispatch(
        &self,
        op: OperationKind,
        total: usize,
        pending: Vec<Task>,
        aggregator: &mut ProgressAggregator<'_>,
        results: &mut Vec<Task>,
    ) -> OrchestratorResult<()> {
        let workers = self.max_workers.min(pending.len());
        tracing::info!(
            "{}: dispatching {} of {} units to {} workers",
            op,
            pending.len(),
            total,
            workers
        );

        let (job_tx, job_rx) = unbounded::<Task>();
        for task in pending {
            // job_rx is alive for the whole function, so this cannot fail.
            let _ = job_tx.send(task);
        }
        drop(job_tx);
        let (done_tx, done_rx) = unbounded::<Task>();

        thread::scope(|scope| -> OrchestratorResult<()> {
            let mut spawned = 0;
            for n in 0..workers {
                let jobs = job_rx.clone();
                let done = done_tx.clone();
                let handle = thread::Builder::new()
                    .name(format!("drama-worker-{}", n + 1))
                    .spawn_scoped(scope, move || self.worker_loop(jobs, done));
                match handle {
                    Ok(_) => spawned += 1,
                    Err(e) if spawned == 0 => return Err(OrchestratorError::Spawn(e)),
                    Err(e) => {
                        tracing::warn!(
                            "Could not start worker {}, continuing with {}: {}",
                            n + 1,
                            spawned,
                            e
                        );
                        break;
                    }
                }
            }
            drop(done_tx);

            for task in done_rx.iter() {
                aggregator.record(&task);
                results.push(task);
            }
            Ok(())
        })
    }

    /// Why a unit is not dispatched, or `None` if it should run.
    fn skip_reason(&self, unit: &WorkUnit, op: OperationKind) -> Option<String> {
        if !self.scanner.validate(unit, op) {
            return Some(format!(
                "{}: structural validation failed, missing inputs for {}",
                unit.id(),
                op
            ));
        }
        if !self.resume {
            return None;
        }
        match self.store.completion(unit.id(), op) {
            Completion::Completed => Some(format!("{}: {} already completed", unit.id(), op)),
            Completion::OutputsMissing(missing) => {
                tracing::warn!(
                    "[{}] {} was recorded as completed but {} output(s) are gone, reprocessing (first: {})",
                    unit.id(),
                    op,
                    missing.len(),
                    missing
                        .first()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                );
                None
            }
            Completion::NotCompleted => None,
        }
    }

    fn worker_loop(&self, jobs: Receiver<Task>, done: Sender<Task>) {
        for mut task in jobs.iter() {
            if self.cancel.is_cancelled() {
                let reason = format!("{}: run cancelled", task.unit_id());
                task.skip(reason);
            } else {
                self.execute_task(&mut task);
            }
            if done.send(task).is_err() {
                break;
            }
        }
    }

    fn execute_task(&self, task: &mut Task) {
        task.start();
        let unit_id = task.unit_id().to_string();
        let op = task.operation;
        tracing::debug!("[{}] {} started", unit_id, op);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.operations.execute(&task.unit, op)
        }))
        .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(output) => match self.store.mark_completed(&unit_id, op, &output.output_paths) {
                Ok(()) => {
                    tracing::info!(
                        "[{}] {} completed ({} outputs)",
                        unit_id,
                        op,
                        output.output_paths.len()
                    );
                    task.complete(output.output_paths, output.duration_seconds);
                }
                Err(e) => {
                    let err = TaskError::Record(e);
                    tracing::error!("[{}] {}", unit_id, err);
                    task.fail(format!("{}: {}", unit_id, err));
                }
            },
            Err(err) => {
                tracing::error!("[{}] {} failed: {}", unit_id, op, err);
                if let Err(e) = self.store.mark_failed(&unit_id, op, &err.to_string()) {
                    tracing::warn!("[{}] Could not record failure: {}", unit_id, e);
                }
                task.fail(format!("{}: {}", unit_id, err));
            }
        }
    }
}

/// Single consumer of terminal-task events.
struct ProgressAggregator<'c> {
    total: usize,
    current: usize,
    callback: Option<&'c ProgressCallback>,
}

impl<'c> ProgressAggregator<'c> {
    fn new(total: usize, callback: Option<&'c ProgressCallback>) -> Self {
        Self {
            total,
            current: 0,
            callback,
        }
    }

    fn record(&mut self, task: &Task) {
        self.current += 1;
        let snapshot = ProgressSnapshot::new(self.current, self.total);
        tracing::debug!(
            "Progress {}/{} ({:.1}%): {} {}",
            snapshot.current,
            snapshot.total,
            snapshot.percentage,
            task.unit_id(),
            task.status()
        );
        if let Some(callback) = self.callback {
            callback(&ProgressEvent::from_task(task), snapshot);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn log_summary(op: OperationKind, results: &[Task]) {
    let count = |status| results.iter().filter(|t| t.status() == status).count();
    tracing::info!(
        "{} finished: {} completed, {} failed, {} skipped",
        op,
        count(TaskStatus::Completed),
        count(TaskStatus::Failed),
        count(TaskStatus::Skipped)
    );
}
