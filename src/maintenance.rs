//! Housekeeping for directories of FreeCAD documents.

use crate::container::FcstdContainer;
use crate::discover::{find_archives_shallow, find_files_with_suffix, BACKUP_EXTENSION};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Extract each `.FCStd` archive directly inside `dir` into a sibling
/// directory named after the file stem (`Part.FCStd` to `Part/`).
///
/// Returns the directories written, in file name order. The first archive
/// that cannot be read stops the run with its error.
pub fn unzip_all(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut extracted = Vec::new();
    for archive in find_archives_shallow(dir.as_ref()) {
        let Some(stem) = archive.file_stem() else {
            continue;
        };
        let target = archive.with_file_name(stem);

        tracing::debug!(archive = %archive.display(), target = %target.display(), "extracting");
        let container = FcstdContainer::open(&archive)?;
        fs::create_dir_all(&target)?;
        container.extract_to(&target)?;
        extracted.push(target);
    }
    Ok(extracted)
}

/// Delete every `.FCStd1` backup under `root`, recursively.
///
/// With `dry_run` nothing is deleted. Returns the backups found.
pub fn remove_backups(root: impl AsRef<Path>, dry_run: bool) -> Result<Vec<PathBuf>> {
    let backups = find_files_with_suffix(root.as_ref(), BACKUP_EXTENSION);
    if !dry_run {
        for backup in &backups {
            tracing::debug!(path = %backup.display(), "removing backup");
            fs::remove_file(backup)?;
        }
    }
    Ok(backups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_archive(path: &Path, members: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, text) in members {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(text.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_unzip_all() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_archive(
            &root.join("Bracket.FCStd"),
            &[("Document.xml", "<Document/>"), ("Shapes/Pad.brp", "brep")],
        );
        fs::create_dir_all(root.join("nested")).unwrap();
        write_archive(&root.join("nested/Inner.FCStd"), &[("Document.xml", "")]);

        let extracted = unzip_all(root).unwrap();
        assert_eq!(extracted, vec![root.join("Bracket")]);
        assert_eq!(
            fs::read_to_string(root.join("Bracket/Document.xml")).unwrap(),
            "<Document/>"
        );
        assert!(root.join("Bracket/Shapes/Pad.brp").is_file());
        assert!(!root.join("nested/Inner").exists());
    }

    #[test]
    fn test_unzip_invalid_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Broken.FCStd"), b"not a zip").unwrap();
        assert!(unzip_all(dir.path()).is_err());
    }

    #[test]
    fn test_remove_backups() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("Main.FCStd"), b"").unwrap();
        fs::write(root.join("Main.FCStd1"), b"").unwrap();
        fs::write(root.join("sub/Part.FCStd1"), b"").unwrap();

        let listed = remove_backups(root, true).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(root.join("Main.FCStd1").exists());

        let removed = remove_backups(root, false).unwrap();
        assert_eq!(removed, listed);
        assert!(!root.join("Main.FCStd1").exists());
        assert!(!root.join("sub/Part.FCStd1").exists());
        assert!(root.join("Main.FCStd").exists());
    }
}
