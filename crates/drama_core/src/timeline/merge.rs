//! Concatenate per-segment timelines into one.
//!
//! Each source is shifted by the total duration of the segments before it,
//! then all entries are renumbered from 1.

use super::error::{TimelineError, TimelineResult};
use super::types::TimelineDocument;

/// Exclusive bound on a cumulative offset; `u64::MAX` rounds up to 2^64 as f64.
const MAX_OFFSET_MS: f64 = u64::MAX as f64;

/// Merge `documents` end to end.
///
/// `durations[i]` is the playback length in seconds of the media segment
/// that `documents[i]` annotates. The output takes its format, header and
/// trailer from the first document.
///
/// Fails when formats differ, when a source is not internally ordered
/// (a start earlier than the previous start, or an end not after its
/// start), when a duration is negative or not finite, or when the running
/// offset no longer fits in milliseconds.
pub fn merge_documents(
    documents: Vec<TimelineDocument>,
    durations: &[f64],
) -> TimelineResult<TimelineDocument> {
    if documents.len() != durations.len() {
        return Err(TimelineError::DurationCountMismatch {
            documents: documents.len(),
            durations: durations.len(),
        });
    }

    let mut sources = documents.into_iter().enumerate();
    let Some((_, first)) = sources.next() else {
        return Err(TimelineError::NoDocuments);
    };

    let mut merged = TimelineDocument::new(first.format);
    merged.header = first.header.clone();
    merged.trailer = first.trailer.clone();

    let mut offset_secs = 0.0_f64;
    for (position, doc) in std::iter::once((0, first)).chain(sources) {
        let name = doc.display_name(position);

        if doc.format != merged.format {
            return Err(TimelineError::FormatMismatch {
                document: name,
                expected: merged.format,
                found: doc.format,
            });
        }
        check_ordering(&doc, &name)?;

        let duration = durations[position];
        let next_offset_secs = offset_secs + duration;
        if !duration.is_finite() || duration < 0.0 || next_offset_secs * 1000.0 >= MAX_OFFSET_MS
        {
            return Err(TimelineError::InvalidDuration {
                document: name,
                value: duration,
            });
        }

        let offset_ms = (offset_secs * 1000.0).round() as u64;
        tracing::debug!(
            "Shifting {} entries of {} by {}ms",
            doc.len(),
            name,
            offset_ms
        );
        for (i, entry) in doc.entries.iter().enumerate() {
            let moved = entry.shifted(offset_ms).ok_or_else(|| {
                TimelineError::malformed(
                    &name,
                    i + 1,
                    format!("end {}ms overflows when shifted by {}ms", entry.end_ms, offset_ms),
                )
            })?;
            merged.entries.push(moved);
        }

        offset_secs = next_offset_secs;
    }

    merged.renumber();
    Ok(merged)
}

fn check_ordering(doc: &TimelineDocument, name: &str) -> TimelineResult<()> {
    let mut previous_start = 0;
    for (i, entry) in doc.entries.iter().enumerate() {
        if entry.end_ms <= entry.start_ms {
            return Err(TimelineError::malformed(
                name,
                i + 1,
                format!(
                    "end {}ms is not after start {}ms",
                    entry.end_ms, entry.start_ms
                ),
            ));
        }
        if entry.start_ms < previous_start {
            return Err(TimelineError::malformed(
                name,
                i + 1,
                format!(
                    "start {}ms precedes previous start {}ms",
                    entry.start_ms, previous_start
                ),
            ));
        }
        previous_start = entry.start_ms;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::types::{TimelineEntry, TimelineFormat};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn doc(format: TimelineFormat, spans: &[(u64, u64)]) -> TimelineDocument {
        let mut d = TimelineDocument::new(format);
        for (i, (s, e)) in spans.iter().enumerate() {
            d.entries
                .push(TimelineEntry::new(i + 1, *s, *e, format!("line {}", i + 1)));
        }
        d
    }

    #[test]
    fn three_segment_scenario() {
        let docs = vec![
            doc(TimelineFormat::Srt, &[(0, 2000)]),
            doc(TimelineFormat::Srt, &[(0, 2000)]),
            doc(TimelineFormat::Srt, &[(0, 2000)]),
        ];
        let merged = merge_documents(docs, &[10.0, 15.5, 8.25]).unwrap();

        let starts: Vec<u64> = merged.entries.iter().map(|e| e.start_ms).collect();
        let ends: Vec<u64> = merged.entries.iter().map(|e| e.end_ms).collect();
        let indices: Vec<usize> = merged.entries.iter().map(|e| e.index).collect();
        assert_eq!(starts, [0, 10_000, 25_500]);
        assert_eq!(ends, [2000, 12_000, 27_500]);
        assert_eq!(indices, [1, 2, 3]);
        assert_eq!(merged.format, TimelineFormat::Srt);
    }

    #[test]
    fn keeps_first_header() {
        let mut a = doc(TimelineFormat::Ass, &[(0, 1000)]);
        a.header = Some("[Script Info]\nTitle: First".to_string());
        let mut b = doc(TimelineFormat::Ass, &[(0, 1000)]);
        b.header = Some("[Script Info]\nTitle: Second".to_string());

        let merged = merge_documents(vec![a, b], &[5.0, 5.0]).unwrap();
        assert_eq!(merged.header.as_deref(), Some("[Script Info]\nTitle: First"));
    }

    #[test]
    fn empty_sources_still_advance_offset() {
        let docs = vec![
            doc(TimelineFormat::Srt, &[]),
            doc(TimelineFormat::Srt, &[(100, 200)]),
        ];
        let merged = merge_documents(docs, &[3.0, 1.0]).unwrap();
        assert_eq!(merged.entries[0].start_ms, 3100);
        assert_eq!(merged.entries[0].index, 1);
    }

    #[test]
    fn mixed_formats_fail() {
        let docs = vec![
            doc(TimelineFormat::Srt, &[(0, 1)]),
            doc(TimelineFormat::Ass, &[(0, 1)]),
        ];
        let err = merge_documents(docs, &[1.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            TimelineError::FormatMismatch {
                expected: TimelineFormat::Srt,
                found: TimelineFormat::Ass,
                ..
            }
        ));
    }

    #[test]
    fn unordered_source_is_named() {
        let mut bad = doc(TimelineFormat::Srt, &[(5000, 6000), (1000, 2000)]);
        bad.source_path = Some(PathBuf::from("srt/ep-2.srt"));
        let docs = vec![doc(TimelineFormat::Srt, &[(0, 1000)]), bad];

        match merge_documents(docs, &[10.0, 10.0]) {
            Err(TimelineError::MalformedTimeline { document, entry, .. }) => {
                assert_eq!(document, "srt/ep-2.srt");
                assert_eq!(entry, 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn zero_length_entry_is_malformed() {
        let docs = vec![doc(TimelineFormat::Srt, &[(1000, 1000)])];
        let err = merge_documents(docs, &[2.0]).unwrap_err();
        assert!(err.to_string().contains("document #1"));
    }

    #[test]
    fn invalid_durations_fail() {
        let err = merge_documents(vec![doc(TimelineFormat::Srt, &[])], &[-1.0]).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidDuration { .. }));

        let err = merge_documents(vec![doc(TimelineFormat::Srt, &[])], &[f64::NAN]).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidDuration { .. }));

        let err = merge_documents(vec![doc(TimelineFormat::Srt, &[])], &[]).unwrap_err();
        assert!(matches!(err, TimelineError::DurationCountMismatch { .. }));

        assert!(matches!(
            merge_documents(Vec::new(), &[]),
            Err(TimelineError::NoDocuments)
        ));
    }

    #[test]
    fn oversized_duration_is_rejected() {
        let a = doc(TimelineFormat::Srt, &[(0, 1000)]);
        let b = doc(TimelineFormat::Srt, &[(0, 1000)]);
        match merge_documents(vec![a, b], &[1e20, 1.0]) {
            Err(TimelineError::InvalidDuration { document, value }) => {
                assert_eq!(document, "document #1");
                assert_eq!(value, 1e20);
            }
            other => panic!("unexpected: {:?}", other),
        }

        let err = merge_documents(vec![doc(TimelineFormat::Srt, &[])], &[f64::MAX]).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidDuration { .. }));
    }

    #[test]
    fn entry_pushed_past_range_is_malformed() {
        let a = doc(TimelineFormat::Srt, &[(0, 1000)]);
        let b = doc(TimelineFormat::Srt, &[(0, u64::MAX - 10)]);
        match merge_documents(vec![a, b], &[60.0, 1.0]) {
            Err(TimelineError::MalformedTimeline { document, entry, message }) => {
                assert_eq!(document, "document #2");
                assert_eq!(entry, 1);
                assert!(message.contains("overflows"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn keeps_first_trailer() {
        let mut a = doc(TimelineFormat::Ass, &[(0, 1000)]);
        a.trailer = Some("[Fonts]\nfontname: a.ttf".to_string());
        let b = doc(TimelineFormat::Ass, &[(0, 1000)]);

        let merged = merge_documents(vec![a, b], &[5.0, 5.0]).unwrap();
        assert_eq!(merged.trailer.as_deref(), Some("[Fonts]\nfontname: a.ttf"));
    }

    /// Strictly ordered spans in `[0, limit_ms)`, each ending before the next starts.
    fn ordered_spans() -> impl Strategy<Value = Vec<(u64, u64)>> {
        proptest::collection::vec((1u64..5_000, 1u64..5_000), 0..15).prop_map(|steps| {
            let mut t = 0;
            steps
                .into_iter()
                .map(|(gap, len)| {
                    let start = t + gap;
                    t = start + len;
                    (start, t)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn merged_starts_strictly_increase(
            segments in proptest::collection::vec((ordered_spans(), 0u64..10_000), 1..8)
        ) {
            let mut docs = Vec::new();
            let mut durations = Vec::new();
            let mut total = 0;
            for (spans, slack_ms) in &segments {
                let d = doc(TimelineFormat::Srt, spans);
                let duration_ms = d.max_end_ms() + 1 + slack_ms;
                durations.push(duration_ms as f64 / 1000.0);
                total += spans.len();
                docs.push(d);
            }

            let merged = merge_documents(docs, &durations).unwrap();
            prop_assert_eq!(merged.len(), total);
            for pair in merged.entries.windows(2) {
                prop_assert!(pair[0].start_ms < pair[1].start_ms);
            }
            for (i, entry) in merged.entries.iter().enumerate() {
                prop_assert_eq!(entry.index, i + 1);
            }
        }
    }
}
