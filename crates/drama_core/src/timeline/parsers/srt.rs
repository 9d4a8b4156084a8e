//! SRT parser.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! Hello, world!
//!
//! 2
//! 00:00:05,000 --> 00:00:08,000
//! Second line.
//! ```
//!
//! Index lines are ignored; entries are renumbered in document order. Caption
//! text is kept line for line, including an empty caption, but cannot contain
//! a blank line since that ends the block.

use crate::timeline::error::ParseError;
use crate::timeline::types::{TimelineDocument, TimelineEntry, TimelineFormat};

/// Parse SRT content into a document.
pub fn parse_srt(content: &str) -> Result<TimelineDocument, ParseError> {
    let mut doc = TimelineDocument::new(TimelineFormat::Srt);

    let content = content
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    // Track 1-based line numbers across blocks for error messages.
    let mut line_offset = 0;

    for block in content.split("\n\n") {
        let lines: Vec<&str> = block.lines().collect();

        let Some(timing_idx) = lines.iter().position(|l| l.contains(" --> ")) else {
            line_offset += lines.len() + 1;
            continue;
        };

        let timing_line = lines[timing_idx];
        let line_num = line_offset + timing_idx + 1;
        let (start_ms, end_ms) = parse_srt_timing(timing_line)
            .ok_or_else(|| ParseError::invalid_time(line_num, timing_line.trim()))?;

        // Whitespace-only lines after the caption belong to the separator.
        let text_end = lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(0, |i| i + 1)
            .max(timing_idx + 1);
        let text = lines[timing_idx + 1..text_end].join("\n");

        let index = doc.entries.len() + 1;
        doc.entries
            .push(TimelineEntry::new(index, start_ms, end_ms, text));

        line_offset += lines.len() + 1;
    }

    Ok(doc)
}

/// Parse `HH:MM:SS,mmm --> HH:MM:SS,mmm`.
fn parse_srt_timing(line: &str) -> Option<(u64, u64)> {
    let (start, end) = line.split_once(" --> ")?;
    // Position hints (`X1:...`) may trail the end time.
    let end = end.split_whitespace().next()?;
    Some((parse_srt_time(start)?, parse_srt_time(end)?))
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm` or `HH:MM:SS.mmm`) to milliseconds.
pub fn parse_srt_time(s: &str) -> Option<u64> {
    let s = s.trim().replace(',', ".");

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u64 = parts[0].parse().ok()?;
    let minutes: u64 = parts[1].parse().ok()?;
    let (secs, frac) = parts[2].split_once('.').unwrap_or((parts[2], ""));
    let seconds: u64 = secs.parse().ok()?;

    clock_to_ms(hours, minutes, seconds, frac)
}

/// Combine clock fields into milliseconds. `None` when the sum does not fit.
pub(crate) fn clock_to_ms(hours: u64, minutes: u64, seconds: u64, frac: &str) -> Option<u64> {
    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes.checked_mul(60_000)?)?
        .checked_add(seconds.checked_mul(1000)?)?
        .checked_add(parse_fraction_ms(frac)?)
}

/// Convert a decimal fraction of a second to milliseconds, rounding past
/// three digits.
fn parse_fraction_ms(frac: &str) -> Option<u64> {
    if frac.is_empty() {
        return Some(0);
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: f64 = format!("0.{}", frac).parse().ok()?;
    Some((value * 1000.0).round() as u64)
}
