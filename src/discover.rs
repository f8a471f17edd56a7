//! Discovery of candidate images on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{IsoRepoError, Result};

/// Extensions (without the dot) that are picked up.
pub const ARCHIVE_EXTENSIONS: [&str; 2] = ["iso", "tar"];

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ARCHIVE_EXTENSIONS.contains(&e))
}

/// Recursively collects `.iso` and `.tar` files under `root`.
///
/// Images are published under their file name, so a second file whose lowercased name was
/// already seen is skipped. Unreadable entries are ignored.
pub fn find_archives(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(IsoRepoError::Io {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            path: root.to_path_buf(),
        });
    }

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !is_archive(entry.path()) {
            continue;
        }
        let key = entry.file_name().to_string_lossy().to_lowercase();
        if seen.insert(key) {
            tracing::info!("found '{}'", entry.path().display());
            found.push(entry.into_path());
        } else {
            tracing::debug!("skipping '{}', name already taken", entry.path().display());
        }
    }
    Ok(found)
}
