//! Timeline writers.
//!
//! Each writer is a pure function from [`TimelineDocument`] to file content.

mod ass;
mod srt;

pub use ass::{format_ass_time, write_ass, DEFAULT_ASS_HEADER};
pub use srt::{format_srt_time, write_srt};

use crate::timeline::types::{TimelineDocument, TimelineFormat};

/// Serialize a document in its own format.
pub fn write_content(doc: &TimelineDocument) -> String {
    match doc.format {
        TimelineFormat::Ass => write_ass(doc),
        TimelineFormat::Srt => write_srt(doc),
    }
}
