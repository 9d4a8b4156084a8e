//! ASS writer.
//!
//! Emits the captured header, then a fresh `[Events]` section, then any
//! captured trailer. Documents without a header get a minimal one with a
//! single `Default` style. An entry without a style gets an empty Style
//! field, which renderers resolve to `Default`.

use crate::timeline::types::TimelineDocument;

/// Header used when the document has none of its own.
pub const DEFAULT_ASS_HEADER: &str = "[Script Info]
Title: Default
ScriptType: v4.00+

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,20,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1";

const EVENTS_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Write a document as ASS.
pub fn write_ass(doc: &TimelineDocument) -> String {
    let header = doc.header.as_deref().unwrap_or(DEFAULT_ASS_HEADER);

    let mut output = String::new();
    output.push_str(header.trim_end());
    output.push_str("\n\n[Events]\n");
    output.push_str(EVENTS_FORMAT);
    output.push('\n');

    for entry in &doc.entries {
        output.push_str(&format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{}\n",
            format_ass_time(entry.start_ms),
            format_ass_time(entry.end_ms),
            entry.style.as_deref().unwrap_or(""),
            entry.text
        ));
    }

    if let Some(trailer) = &doc.trailer {
        output.push('\n');
        output.push_str(trailer.trim_end());
        output.push('\n');
    }

    output
}

/// Format milliseconds as `H:MM:SS.cc`, rounding to the nearest centisecond.
pub fn format_ass_time(ms: u64) -> String {
    let cs = (ms + 5) / 10;
    let centis = cs % 100;
    let total_secs = cs / 100;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, centis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::types::{TimelineEntry, TimelineFormat};

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0), "0:00:00.00");
        assert_eq!(format_ass_time(1500), "0:00:01.50");
        assert_eq!(format_ass_time(5_025_670), "1:23:45.67");
        assert_eq!(format_ass_time(1234), "0:00:01.23");
        assert_eq!(format_ass_time(59_995), "0:01:00.00");
    }

    #[test]
    fn writes_header_then_events() {
        let mut doc = TimelineDocument::new(TimelineFormat::Ass);
        doc.header = Some("[Script Info]\nTitle: Kept\n".to_string());
        doc.entries
            .push(TimelineEntry::new(1, 1000, 3000, "Hello").with_style("Top"));
        doc.entries.push(TimelineEntry::new(2, 4000, 5000, "Plain"));

        let out = write_ass(&doc);
        assert_eq!(
            out,
            "[Script Info]\nTitle: Kept\n\n[Events]\n\
             Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n\
             Dialogue: 0,0:00:01.00,0:00:03.00,Top,,0,0,0,,Hello\n\
             Dialogue: 0,0:00:04.00,0:00:05.00,,,0,0,0,,Plain\n"
        );
    }

    #[test]
    fn trailer_follows_events() {
        let mut doc = TimelineDocument::new(TimelineFormat::Ass);
        doc.header = Some("[Script Info]\nTitle: Kept".to_string());
        doc.trailer = Some("[Fonts]\nfontname: a.ttf".to_string());
        doc.entries.push(TimelineEntry::new(1, 1000, 2000, "Hi"));

        let out = write_ass(&doc);
        assert!(out.ends_with(
            "Dialogue: 0,0:00:01.00,0:00:02.00,,,0,0,0,,Hi\n\n[Fonts]\nfontname: a.ttf\n"
        ));
        let events = out.find("[Events]").unwrap();
        assert!(out.find("[Fonts]").unwrap() > events);
    }

    #[test]
    fn falls_back_to_default_header() {
        let doc = TimelineDocument::new(TimelineFormat::Ass);
        let out = write_ass(&doc);
        assert!(out.starts_with("[Script Info]\nTitle: Default"));
        assert!(out.contains("Style: Default,Arial,20"));
        assert!(out.ends_with("Effect, Text\n"));
    }
}
