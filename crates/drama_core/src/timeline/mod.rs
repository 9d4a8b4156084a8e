//! Subtitle timelines: parsing, merging, and writing.
//!
//! Supports two formats: SRT (plain blocks) and ASS (header plus styled
//! events). Timing is integer milliseconds throughout.
//!
//! # Example
//!
//! ```no_run
//! use drama_core::timeline;
//!
//! let a = timeline::parse_file("srt/ep-1.srt").unwrap();
//! let b = timeline::parse_file("srt/ep-2.srt").unwrap();
//! let merged = timeline::merge_documents(vec![a, b], &[62.4, 58.0]).unwrap();
//! timeline::write_file(&merged, "merged/merged.srt").unwrap();
//! ```

pub mod error;
mod merge;
pub mod parsers;
pub mod types;
pub mod writers;

pub use error::{ParseError, TimelineError, TimelineResult};
pub use merge::merge_documents;
pub use types::{TimelineDocument, TimelineEntry, TimelineFormat};

use std::path::Path;

/// Parse a timeline file, using the extension to pick the format.
pub fn parse_file(path: impl AsRef<Path>) -> TimelineResult<TimelineDocument> {
    let path = path.as_ref();
    let format = TimelineFormat::from_extension(path)
        .ok_or_else(|| TimelineError::UnknownFormat(path.to_path_buf()))?;

    let content = std::fs::read_to_string(path).map_err(|e| TimelineError::read(path, e))?;

    let mut doc = parsers::parse_content(&content, Some(format))?;
    doc.source_path = Some(path.to_path_buf());
    Ok(doc)
}

/// Serialize a document in its own format.
pub fn serialize(doc: &TimelineDocument) -> String {
    writers::write_content(doc)
}

/// Write a document to disk in its own format.
pub fn write_file(doc: &TimelineDocument, path: impl AsRef<Path>) -> TimelineResult<()> {
    let path = path.as_ref();
    std::fs::write(path, serialize(doc)).map_err(|e| TimelineError::write(path, e))
}
