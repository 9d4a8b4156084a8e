//! ASS/SSA parser.
//!
//! Everything before the `[Events]` section is kept verbatim as the document
//! header, and any sections after it (embedded fonts, editor state) as the
//! trailer. Only `Dialogue:` lines become entries; `Comment:` lines are
//! dropped.
//!
//! Timing is `H:MM:SS.cc` (centiseconds).

use crate::timeline::error::ParseError;
use crate::timeline::parsers::clock_to_ms;
use crate::timeline::types::{TimelineDocument, TimelineEntry, TimelineFormat};

/// Parse ASS content into a document.
pub fn parse_ass(content: &str) -> Result<TimelineDocument, ParseError> {
    let mut doc = TimelineDocument::new(TimelineFormat::Ass);
    let mut header_lines: Vec<&str> = Vec::new();
    let mut trailer_lines: Vec<&str> = Vec::new();
    let mut section = Section::Header;
    let mut event_format: Vec<String> = Vec::new();

    let content = content.trim_start_matches('\u{feff}');

    for (line_num, raw) in content.lines().enumerate() {
        let line_num = line_num + 1;
        let line = raw.trim();

        if line.starts_with('[') && line.ends_with(']') {
            section = if line.eq_ignore_ascii_case("[events]") {
                Section::Events
            } else if section == Section::Header {
                Section::Header
            } else {
                Section::Trailer
            };
        }

        match section {
            Section::Header => header_lines.push(raw.trim_end()),
            Section::Trailer => trailer_lines.push(raw.trim_end()),
            Section::Events if line.starts_with("Format:") => {
                event_format = parse_format_line(line);
            }
            Section::Events if line.starts_with("Dialogue:") => {
                let index = doc.entries.len() + 1;
                let entry = parse_dialogue_line(line, &event_format, index, line_num)?;
                doc.entries.push(entry);
            }
            Section::Events => {}
        }
    }

    doc.header = joined(&header_lines);
    doc.trailer = joined(&trailer_lines);

    Ok(doc)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Events,
    Trailer,
}

fn joined(lines: &[&str]) -> Option<String> {
    let text = lines.join("\n");
    let text = text.trim_end();
    (!text.is_empty()).then(|| text.to_string())
}

/// Parse a Format: line to get lowercase field names.
fn parse_format_line(line: &str) -> Vec<String> {
    line.trim_start_matches("Format:")
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .collect()
}

fn default_event_format() -> Vec<String> {
    [
        "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect",
        "text",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Parse a Dialogue: line.
fn parse_dialogue_line(
    line: &str,
    format: &[String],
    index: usize,
    line_num: usize,
) -> Result<TimelineEntry, ParseError> {
    let content = line.trim_start_matches("Dialogue:").trim();

    let format = if format.is_empty() {
        default_event_format()
    } else {
        format.to_vec()
    };

    // Text is the last field and may contain commas.
    let text_index = format.iter().position(|f| f == "text").unwrap_or(9);
    let parts: Vec<&str> = content.splitn(text_index + 1, ',').collect();

    if parts.len() <= text_index {
        return Err(ParseError::invalid_event(
            line_num,
            format!("Expected {} fields, got {}", text_index + 1, parts.len()),
        ));
    }

    let mut start = None;
    let mut end = None;
    let mut entry = TimelineEntry::new(index, 0, 0, "");

    for (i, field_name) in format.iter().enumerate() {
        let value = parts.get(i).map(|s| s.trim()).unwrap_or("");

        match field_name.as_str() {
            "start" => {
                start = Some(
                    parse_ass_time(value).ok_or_else(|| ParseError::invalid_time(line_num, value))?,
                );
            }
            "end" => {
                end = Some(
                    parse_ass_time(value).ok_or_else(|| ParseError::invalid_time(line_num, value))?,
                );
            }
            "style" if !value.is_empty() => entry.style = Some(value.to_string()),
            "text" => entry.text = value.to_string(),
            _ => {}
        }
    }

    match (start, end) {
        (Some(start_ms), Some(end_ms)) => {
            entry.start_ms = start_ms;
            entry.end_ms = end_ms;
            Ok(entry)
        }
        _ => Err(ParseError::invalid_event(
            line_num,
            "Format is missing Start or End",
        )),
    }
}

/// Parse an ASS timestamp (`H:MM:SS.cc`) to milliseconds.
pub fn parse_ass_time(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u64 = parts[0].parse().ok()?;
    let minutes: u64 = parts[1].parse().ok()?;
    let (secs, frac) = parts[2].split_once('.').unwrap_or((parts[2], ""));
    let seconds: u64 = secs.parse().ok()?;

    clock_to_ms(hours, minutes, seconds, frac)
}
