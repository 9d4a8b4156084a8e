//! Discovery of episode bundles under the drama root.
//!
//! ```text
//! drama/
//! ├── drama-0001/
//! │   ├── original/video/   (or video/)   raw segments
//! │   ├── original/srt/     (or srt/)     subtitle segments
//! │   ├── merged/                         merge output
//! │   ├── cleared/                        separate output
//! │   └── encoded/                        transcode output
//! └── drama-0002/
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{Capabilities, OperationKind, WorkUnit};
use crate::orchestrator::UnitScanner;

static DRAMA_DIR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^drama-\d{4}$").expect("valid drama dir regex"));

/// Input subdirectory names.
pub const VIDEO_DIR: &str = "video";
pub const SRT_DIR: &str = "srt";
pub const MERGED_DIR: &str = "merged";
pub const CLEARED_DIR: &str = "cleared";
pub const ENCODED_DIR: &str = "encoded";

/// Errors from directory discovery.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Drama root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Drama root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read '{path}': {source}")]
    ReadError { path: PathBuf, source: io::Error },

    #[error("Invalid directory pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Find `name` under `unit_dir`, preferring `original/<name>` over `<name>`.
pub fn resolve_subdir(unit_dir: &Path, name: &str) -> Option<PathBuf> {
    [unit_dir.join("original").join(name), unit_dir.join(name)]
        .into_iter()
        .find(|p| p.is_dir())
}

/// Scans a root for `drama-XXXX` directories.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    pattern: Regex,
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self {
            pattern: DRAMA_DIR_PATTERN.clone(),
        }
    }
}

impl DirectoryScanner {
    /// Scanner for the standard `drama-XXXX` naming.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanner with a custom directory name pattern.
    pub fn with_pattern(pattern: &str) -> ScanResult<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// List matching unit directories, sorted by name.
    pub fn scan(&self, root: &Path) -> ScanResult<Vec<WorkUnit>> {
        if !root.exists() {
            return Err(ScanError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let read_err = |source| ScanError::ReadError {
            path: root.to_path_buf(),
            source,
        };

        let mut units = Vec::new();
        for entry in fs::read_dir(root).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !self.pattern.is_match(name) {
                continue;
            }

            let capabilities = Capabilities {
                has_video: resolve_subdir(&path, VIDEO_DIR).is_some(),
                has_srt: resolve_subdir(&path, SRT_DIR).is_some(),
                has_merged: resolve_subdir(&path, MERGED_DIR).is_some(),
                has_cleared: resolve_subdir(&path, CLEARED_DIR).is_some(),
            };
            units.push(WorkUnit::new(name, &path, capabilities));
        }

        units.sort_by(|a, b| a.id().cmp(b.id()));
        tracing::info!("Found {} units under {}", units.len(), root.display());
        Ok(units)
    }
}

impl UnitScanner for DirectoryScanner {
    fn list_work_units(&self, root: &Path) -> ScanResult<Vec<WorkUnit>> {
        self.scan(root)
    }

    fn validate(&self, unit: &WorkUnit, op: OperationKind) -> bool {
        unit.capabilities().supports(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn mkdirs(root: &Path, dirs: &[&str]) {
        for d in dirs {
            fs::create_dir_all(root.join(d)).unwrap();
        }
    }

    #[test]
    fn scan_filters_and_sorts() {
        let root = tempdir().unwrap();
        mkdirs(
            root.path(),
            &["drama-0002/video", "drama-0001/original/srt", "drama-12", "other"],
        );
        fs::write(root.path().join("drama-0003"), b"not a dir").unwrap();

        let units = DirectoryScanner::new().scan(root.path()).unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.id()).collect();
        assert_eq!(ids, ["drama-0001", "drama-0002"]);

        assert!(units[0].capabilities().has_srt);
        assert!(!units[0].capabilities().has_video);
        assert!(units[1].capabilities().has_video);
    }

    #[test]
    fn original_layout_is_preferred() {
        let root = tempdir().unwrap();
        mkdirs(root.path(), &["u/original/video", "u/video"]);
        let unit = root.path().join("u");
        assert_eq!(
            resolve_subdir(&unit, VIDEO_DIR),
            Some(unit.join("original").join("video"))
        );
        assert_eq!(resolve_subdir(&unit, SRT_DIR), None);
    }

    #[test]
    fn validate_matches_stage_inputs() {
        let root = tempdir().unwrap();
        mkdirs(root.path(), &["drama-0001/merged"]);
        let scanner = DirectoryScanner::new();
        let units = scanner.list_work_units(root.path()).unwrap();

        assert!(!scanner.validate(&units[0], OperationKind::Merge));
        assert!(scanner.validate(&units[0], OperationKind::Separate));
        assert!(!scanner.validate(&units[0], OperationKind::Transcode));
    }

    #[test]
    fn missing_root_is_error() {
        let root = tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(matches!(
            DirectoryScanner::new().scan(&missing),
            Err(ScanError::RootNotFound(_))
        ));

        let file = root.path().join("file");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            DirectoryScanner::new().scan(&file),
            Err(ScanError::NotADirectory(_))
        ));
    }

    #[test]
    fn custom_pattern() {
        let root = tempdir().unwrap();
        mkdirs(root.path(), &["show-1/video", "drama-0001/video"]);
        let scanner = DirectoryScanner::with_pattern(r"^show-\d+$").unwrap();
        let units = scanner.scan(root.path()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id(), "show-1");

        assert!(DirectoryScanner::with_pattern("(").is_err());
    }
}
