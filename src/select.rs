use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{GalleryError, Result};

const JPEG_SUFFIX: &str = "jpg";

/// A local image eligible for the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Base file name, used for archive entries and destination keys
    pub name: String,
}

/// Collect the regular files directly inside `dir` whose name ends with
/// `jpg` (any case), sorted by name using byte-wise comparison
///
/// Subdirectories are neither returned nor descended into. Symlinks count
/// when they resolve to a regular file. A `dir` that is not a directory is
/// unreadable.
pub fn select_jpegs(dir: &Path) -> Result<Vec<SourceFile>> {
    let unreadable = |source: std::io::Error| GalleryError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(dir).map_err(unreadable)?;
    if !metadata.is_dir() {
        return Err(unreadable(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            "not a directory",
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| unreadable(e.into()))?;
        // Follows symlinks; dangling links are skipped
        if !entry.path().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !has_jpeg_suffix(&name) {
            debug!("Skipping non-jpeg file {}", name);
            continue;
        }

        files.push(SourceFile {
            path: entry.into_path(),
            name,
        });
    }

    files.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    Ok(files)
}

fn has_jpeg_suffix(name: &str) -> bool {
    name.len() >= JPEG_SUFFIX.len()
        && name
            .get(name.len() - JPEG_SUFFIX.len()..)
            .is_some_and(|suffix| suffix.eq_ignore_ascii_case(JPEG_SUFFIX))
}
