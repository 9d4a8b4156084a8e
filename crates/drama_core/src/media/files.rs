//! Output path and file copy helpers.

use std::fs;
use std::path::{Path, PathBuf};

use super::{MediaError, MediaResult};

/// `path` if nothing exists there, otherwise the first free
/// `stem_N.ext` next to it (N = 1, 2, ...).
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let candidate = parent.join(format!("{}_{}{}", stem, counter, ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

pub fn ensure_dir(dir: &Path) -> MediaResult<()> {
    fs::create_dir_all(dir).map_err(|e| MediaError::io(dir, e))
}

/// Files in `dir` with extension `ext` (case-insensitive), sorted by name.
pub fn files_with_extension(dir: &Path, ext: &str) -> MediaResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| MediaError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MediaError::io(dir, e))?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// First file by name with extension `ext` in `dir`.
pub fn first_with_extension(dir: &Path, ext: &str) -> MediaResult<Option<PathBuf>> {
    Ok(files_with_extension(dir, ext)?.into_iter().next())
}

/// Copy `src` into `dest_dir` under its own name, or a unique variant of it.
pub fn copy_to_unique(src: &Path, dest_dir: &Path) -> MediaResult<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| MediaError::FileNotFound(src.to_path_buf()))?;
    let dest = unique_path(&dest_dir.join(name));
    fs::copy(src, &dest).map_err(|e| MediaError::io(&dest, e))?;
    Ok(dest)
}
