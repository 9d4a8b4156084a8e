//! Deterministic ordering and completeness checks for segment files.
//!
//! Segment files (`video-1.mp4`, `video-2.mp4`, ...) are ordered by their
//! [`OrdinalKey`], with the full file name as the final tie-break, and then
//! validated so that their leading numbers form one contiguous run.
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use drama_core::sequencer;
//!
//! let files = vec![PathBuf::from("ep-10.mp4"), PathBuf::from("ep-9.mp4")];
//! let sorted = sequencer::sort_files(files);
//! assert_eq!(sorted[0].file_name(), "ep-9.mp4");
//! assert!(sequencer::validate(&sorted).is_ok());
//! ```

mod key;

pub use key::{KeyPart, OrdinalKey};

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Errors raised by sequence validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// No files were given.
    #[error("Empty sequence: no files to order")]
    EmptySequence,

    /// A leading number appears more than once.
    #[error("Duplicate sequence numbers: {}", join_numbers(.0))]
    DuplicateSequence(Vec<u64>),

    /// The leading numbers have gaps.
    #[error("Missing sequence numbers: {}", join_numbers(.0))]
    MissingSequence(Vec<u64>),
}

/// Upper bound on the gap list carried by `MissingSequence`.
const MAX_REPORTED_MISSING: usize = 1000;

/// Result type for sequence operations.
pub type SequenceResult<T> = Result<T, SequenceError>;

fn join_numbers(numbers: &[u64]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A file paired with its ordinal key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedFile {
    path: PathBuf,
    key: OrdinalKey,
}

impl SequencedFile {
    /// Derive the key for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let key = OrdinalKey::from_path(&path);
        Self { path, key }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &OrdinalKey {
        &self.key
    }

    /// File name used for tie-breaking and messages.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Leading numeric component used by validation.
    pub fn sequence_number(&self) -> u64 {
        self.key.leading_number()
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

impl Ord for SequencedFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.file_name().cmp(&other.file_name()))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for SequencedFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort files into natural order.
pub fn sort_files<I, P>(files: I) -> Vec<SequencedFile>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut sequenced: Vec<SequencedFile> = files.into_iter().map(SequencedFile::new).collect();
    sequenced.sort();
    sequenced
}

/// Check that the leading numbers are unique and contiguous.
///
/// Duplicates are reported before gaps. Missing numbers are the values
/// between the observed minimum and maximum that no file carries, capped at
/// the first thousand.
pub fn validate(files: &[SequencedFile]) -> SequenceResult<()> {
    if files.is_empty() {
        return Err(SequenceError::EmptySequence);
    }

    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for file in files {
        let n = file.sequence_number();
        if !seen.insert(n) {
            duplicates.insert(n);
        }
    }

    if !duplicates.is_empty() {
        return Err(SequenceError::DuplicateSequence(
            duplicates.into_iter().collect(),
        ));
    }

    let numbers: Vec<u64> = seen.into_iter().collect();
    let mut missing = Vec::new();
    'gaps: for pair in numbers.windows(2) {
        for n in pair[0] + 1..pair[1] {
            if missing.len() == MAX_REPORTED_MISSING {
                break 'gaps;
            }
            missing.push(n);
        }
    }

    if !missing.is_empty() {
        return Err(SequenceError::MissingSequence(missing));
    }

    Ok(())
}

/// Sort and validate in one step.
pub fn sequence<I, P>(files: I) -> SequenceResult<Vec<SequencedFile>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let sorted = sort_files(files);
    validate(&sorted)?;
    Ok(sorted)
}

/// List files in `dir` whose extension matches one of `extensions`
/// (case-insensitive), in natural order.
pub fn list_sorted(dir: &Path, extensions: &[&str]) -> std::io::Result<Vec<SequencedFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    Ok(sort_files(files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn names(files: &[SequencedFile]) -> Vec<String> {
        files.iter().map(|f| f.file_name()).collect()
    }

    #[test]
    fn sorts_naturally() {
        let sorted = sort_files(["video-10.mp4", "video-2.mp4", "video-1.mp4"]);
        assert_eq!(names(&sorted), ["video-1.mp4", "video-2.mp4", "video-10.mp4"]);
    }

    #[test]
    fn mixed_numeric_and_literal_names() {
        let sorted = sort_files(["intro.mp4", "02-main.mp4", "01-open.mp4", "outro.mp4"]);
        assert_eq!(
            names(&sorted),
            ["01-open.mp4", "02-main.mp4", "intro.mp4", "outro.mp4"]
        );
    }

    #[test]
    fn tie_breaks_on_file_name() {
        // Same key, different extensions.
        let sorted = sort_files(["ep-1.srt", "ep-1.ass"]);
        assert_eq!(names(&sorted), ["ep-1.ass", "ep-1.srt"]);

        // Same key after case folding.
        let sorted = sort_files(["EP-1.mp4", "ep-1.mp4"]);
        assert_eq!(names(&sorted), ["EP-1.mp4", "ep-1.mp4"]);
    }

    #[test]
    fn validate_accepts_contiguous_from_any_start() {
        let sorted = sort_files(["e5.mp4", "e6.mp4", "e7.mp4"]);
        assert!(validate(&sorted).is_ok());
    }

    #[test]
    fn validate_rejects_empty() {
        assert_eq!(validate(&[]), Err(SequenceError::EmptySequence));
    }

    #[test]
    fn validate_names_duplicates() {
        let sorted = sort_files(["v-1.mp4", "v-2.mp4", "v-02-b.mp4", "v-3.mp4", "w-3.mp4"]);
        assert_eq!(
            validate(&sorted),
            Err(SequenceError::DuplicateSequence(vec![2, 3]))
        );
    }

    #[test]
    fn validate_names_gaps() {
        let sorted = sort_files(["v-1.mp4", "v-4.mp4", "v-6.mp4"]);
        assert_eq!(
            validate(&sorted),
            Err(SequenceError::MissingSequence(vec![2, 3, 5]))
        );
    }

    #[test]
    fn error_messages_list_numbers() {
        let err = SequenceError::MissingSequence(vec![2, 5]);
        assert_eq!(err.to_string(), "Missing sequence numbers: 2, 5");
    }

    #[test]
    fn list_sorted_filters_extensions() {
        let dir = tempdir().unwrap();
        for name in ["b-2.MP4", "b-1.mp4", "notes.txt", "b-3.srt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("b-9.mp4")).unwrap();

        let files = list_sorted(dir.path(), &["mp4"]).unwrap();
        assert_eq!(names(&files), ["b-1.mp4", "b-2.MP4"]);
    }

    proptest! {
        #[test]
        fn order_is_permutation_invariant(
            numbers in proptest::collection::btree_set(0u64..10_000, 1..40),
            seed in any::<u64>(),
        ) {
            let files: Vec<String> = numbers.iter().map(|n| format!("seg-{}.mp4", n)).collect();
            let mut shuffled = files.clone();
            // Deterministic shuffle driven by the seed.
            let len = shuffled.len();
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }

            let a = sort_files(files);
            let b = sort_files(shuffled);
            prop_assert_eq!(&a, &b);

            let leading: Vec<u64> = a.iter().map(|f| f.sequence_number()).collect();
            let expected: Vec<u64> = numbers.into_iter().collect();
            prop_assert_eq!(leading, expected);
        }

        #[test]
        fn injected_duplicate_is_named(count in 2u64..30, dup in 0u64..30) {
            let dup = dup % count;
            let mut files: Vec<String> = (0..count).map(|n| format!("part{}.ass", n)).collect();
            files.push(format!("part{}-extra.ass", dup));
            let sorted = sort_files(files);
            prop_assert_eq!(validate(&sorted), Err(SequenceError::DuplicateSequence(vec![dup])));
        }

        #[test]
        fn injected_gap_is_named(count in 3u64..30, gap in 1u64..29) {
            let gap = 1 + gap % (count - 2);
            let files: Vec<String> = (0..count)
                .filter(|n| *n != gap)
                .map(|n| format!("clip_{}.mp4", n))
                .collect();
            let sorted = sort_files(files);
            prop_assert_eq!(validate(&sorted), Err(SequenceError::MissingSequence(vec![gap])));
        }
    }
}
