//! Drama Core - resumable batch processing for episodic video bundles
//!
//! Each `drama-XXXX` directory under a root is one unit. A run applies one
//! operation (merge, separate or transcode) to every unit on a bounded
//! worker pool, records completions in a durable state file so reruns
//! only redo what is missing, and summarizes the outcome in a report.

pub mod batch;
pub mod config;
pub mod logging;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod scanner;
pub mod sequencer;
pub mod state;
pub mod timeline;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
