//! SRT writer.

use crate::timeline::types::TimelineDocument;

/// Write a document as SRT.
///
/// Entries are numbered by position and separated by one blank line.
pub fn write_srt(doc: &TimelineDocument) -> String {
    let mut output = String::new();

    for (i, entry) in doc.entries.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(entry.start_ms),
            format_srt_time(entry.end_ms)
        ));
        output.push_str(&entry.text);
        output.push('\n');
    }

    output
}

/// Format milliseconds as `HH:MM:SS,mmm`.
pub fn format_srt_time(ms: u64) -> String {
    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}
