//! Document discovery.
//!
//! Walks the source root and returns every file whose name ends with the
//! document suffix (`.md` by default), in sorted order so builds are
//! reproducible:
//!
//! ```text
//! docs/                       # source root
//! ├── intro.md                → docs/intro.md
//! ├── guide/
//! │   ├── install.md          → docs/guide/install.md
//! │   └── usage.md            → docs/guide/usage.md
//! └── images/
//!     └── diagram.png         (not a document; copied as an asset)
//! ```
//!
//! Paths with whitespace below the root are rejected: they would turn into
//! URLs with spaces.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source directory does not exist: {0}")]
    MissingRoot(PathBuf),
    #[error("Whitespace in document path: {0}")]
    Whitespace(PathBuf),
}

/// Sorted paths of all documents under `root`.
pub fn discover(root: &Path, suffix: &str) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    let mut documents = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(suffix) {
            documents.push(entry.into_path());
        }
    }
    documents.sort();
    if let Some(bad) = documents.iter().find(|path| {
        let relative = path.strip_prefix(root).unwrap_or(path.as_path());
        relative.to_string_lossy().chars().any(char::is_whitespace)
    }) {
        return Err(ScanError::Whitespace(bad.clone()));
    }
    Ok(documents)
}
