//! Durable completion state for resumable runs.
//!
//! One JSON file maps `"<unit>:<operation>"` to a [`StateRecord`]. A record
//! only counts as completed while every output it lists still exists, so
//! deleting an output makes the next run redo that unit.

mod store;
mod types;

pub use store::StateStore;
pub use types::{Completion, StateError, StateRecord, StateResult, StateSummary};
