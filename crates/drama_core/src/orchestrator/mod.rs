//! Concurrent batch orchestration.
//!
//! ```text
//! units ──► admission ──► queue ──► worker 1..N ──► state store
//!           (validate,                  │
//!            resume)                    ▼
//!                                 done channel ──► progress + results
//! ```
//!
//! # Example
//!
//! ```ignore
//! use drama_core::orchestrator::TaskOrchestrator;
//!
//! let orchestrator = TaskOrchestrator::new(&store, &scanner, &operations, 4)?;
//! let tasks = orchestrator.run_root(root, OperationKind::Merge)?;
//! ```

mod collaborators;
mod errors;
mod runner;
mod types;

pub use collaborators::{
    DurationProvider, MediaOperation, OperationOutput, OperationSet, UnitScanner,
};
pub use errors::{ExecResult, OrchestratorError, OrchestratorResult, TaskError};
pub use runner::TaskOrchestrator;
pub use types::{CancelHandle, ProgressCallback, ProgressEvent, ProgressSnapshot, Task};
