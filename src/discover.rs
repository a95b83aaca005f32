//! Discovery of archive files on disk.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extension of FreeCAD documents.
pub const FCSTD_EXTENSION: &str = ".FCStd";

/// File extension of the backup copies FreeCAD writes next to a document.
pub const BACKUP_EXTENSION: &str = ".FCStd1";

/// Recursively collect every regular file under `root` whose name ends in
/// `suffix`.
///
/// The match is case-sensitive and applies to the whole file name, so
/// `Part.FCStd1` is not returned for `.FCStd`. Entries that cannot be read
/// are skipped with a warning. Files are returned in traversal order, with
/// siblings sorted by name; each file appears exactly once.
pub fn find_files_with_suffix(root: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(suffix) {
            found.push(entry.into_path());
        }
    }
    found
}

/// Recursively collect every `.FCStd` archive under `root`.
pub fn find_archives(root: &Path) -> Vec<PathBuf> {
    find_files_with_suffix(root, FCSTD_EXTENSION)
}

/// Collect `.FCStd` archives directly inside `dir`, without descending.
pub fn find_archives_shallow(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(FCSTD_EXTENSION))
        .map(|e| e.into_path())
        .collect()
}
