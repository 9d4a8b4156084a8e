//! Timeline parsers.
//!
//! Each parser is a pure function from content to [`TimelineDocument`].

mod ass;
mod srt;

pub use ass::{parse_ass, parse_ass_time};
pub use srt::{parse_srt, parse_srt_time};

pub(crate) use srt::clock_to_ms;

use crate::timeline::error::ParseError;
use crate::timeline::types::{TimelineDocument, TimelineFormat};

/// Parse content, detecting the format when not given.
pub fn parse_content(
    content: &str,
    format: Option<TimelineFormat>,
) -> Result<TimelineDocument, ParseError> {
    match format.unwrap_or_else(|| detect_format(content)) {
        TimelineFormat::Ass => parse_ass(content),
        TimelineFormat::Srt => parse_srt(content),
    }
}

/// Detect format from content.
fn detect_format(content: &str) -> TimelineFormat {
    let lower = content.to_lowercase();
    if lower.contains("[script info]") || lower.contains("[events]") {
        TimelineFormat::Ass
    } else {
        TimelineFormat::Srt
    }
}
