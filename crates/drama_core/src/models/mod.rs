//! Data models shared across the crate.
//!
//! - Enums for operation kinds and task status
//! - Work units discovered under the drama root

mod enums;
mod unit;

pub use enums::{OperationKind, TaskStatus};
pub use unit::{Capabilities, WorkUnit};
