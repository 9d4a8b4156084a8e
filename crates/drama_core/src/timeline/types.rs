//! Core timeline types.
//!
//! All timing values are integer milliseconds. ASS output rounds to
//! centiseconds at write time.

use std::fmt;
use std::path::{Path, PathBuf};

/// Supported timeline document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimelineFormat {
    /// SubRip (.srt): numbered blocks separated by blank lines.
    Srt,
    /// Advanced SubStation Alpha (.ass, .ssa): header sections plus styled events.
    Ass,
}

impl TimelineFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "srt" => Some(Self::Srt),
            "ass" | "ssa" => Some(Self::Ass),
            _ => None,
        }
    }

    /// Typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Ass => "ass",
        }
    }
}

impl fmt::Display for TimelineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Srt => "SRT",
            Self::Ass => "ASS",
        })
    }
}

/// One captioned span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    /// 1-based position in its document.
    pub index: usize,
    /// Start offset in milliseconds.
    pub start_ms: u64,
    /// End offset in milliseconds.
    pub end_ms: u64,
    /// Caption text. Multi-line SRT text keeps its `\n` separators.
    pub text: String,
    /// ASS style reference.
    pub style: Option<String>,
}

impl TimelineEntry {
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
            text: text.into(),
            style: None,
        }
    }

    /// Builder: set the style reference.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Copy of this entry moved later by `offset_ms`, or `None` if either
    /// end would pass `u64::MAX`.
    pub fn shifted(&self, offset_ms: u64) -> Option<Self> {
        Some(Self {
            start_ms: self.start_ms.checked_add(offset_ms)?,
            end_ms: self.end_ms.checked_add(offset_ms)?,
            ..self.clone()
        })
    }
}

/// An ordered set of entries in one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineDocument {
    /// Document format.
    pub format: TimelineFormat,
    /// Entries in document order.
    pub entries: Vec<TimelineEntry>,
    /// Everything before `[Events]` in an ASS source, kept verbatim.
    pub header: Option<String>,
    /// Sections after `[Events]` in an ASS source, kept verbatim.
    pub trailer: Option<String>,
    /// Source file path (if loaded from file).
    pub source_path: Option<PathBuf>,
}

impl TimelineDocument {
    /// Create an empty document.
    pub fn new(format: TimelineFormat) -> Self {
        Self {
            format,
            entries: Vec::new(),
            header: None,
            trailer: None,
            source_path: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End of the last-ending entry, or 0 for an empty document.
    pub fn max_end_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.end_ms).max().unwrap_or(0)
    }

    /// Reassign indices 1..=len in current order.
    pub fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.index = i + 1;
        }
    }

    /// Name used in error messages.
    pub fn display_name(&self, position: usize) -> String {
        match &self.source_path {
            Some(path) => path.display().to_string(),
            None => format!("document #{}", position + 1),
        }
    }
}
