//! Static assets: the stylesheet and the image directory.
//!
//! The stylesheet is compiled into the binary and written as `app.css`. Pages
//! link it with a `?v=` query derived from its content, so a new build with
//! changed CSS busts browser caches while unchanged CSS stays cached.
//!
//! The configured image directory is copied byte-for-byte from the source
//! root to the output root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

pub const CSS_FILE_NAME: &str = "app.css";
const CSS_CONTENT: &str = include_str!("../static/app.css");
/// Hex characters of the content hash used as the version.
const VERSION_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to copy {path}: {source}")]
    Copy { path: PathBuf, source: io::Error },
    #[error("Failed to walk image directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Image directory must be relative to the source directory: {0:?}")]
    ImageDir(String),
}

/// Content version of the bundled stylesheet.
pub fn css_version() -> String {
    let digest = Sha256::digest(CSS_CONTENT.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(VERSION_LEN);
    hex
}

/// `<base>/app.css?v=<version>`
pub fn css_href(base_url: &str) -> String {
    format!("{base_url}/{CSS_FILE_NAME}?v={}", css_version())
}

pub fn write_stylesheet(output_dir: &Path) -> Result<PathBuf, AssetError> {
    let path = output_dir.join(CSS_FILE_NAME);
    fs::create_dir_all(output_dir)
        .and_then(|_| fs::write(&path, CSS_CONTENT))
        .map_err(|source| AssetError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// `image_dir` as a path below the source root, or `None` if it is empty,
/// absolute, or has `.`/`..` segments. Trailing slashes are ignored.
pub fn image_subdir(image_dir: &str) -> Option<&Path> {
    let path = Path::new(image_dir.trim_end_matches('/'));
    let mut components = path.components().peekable();
    let plain = components.peek().is_some()
        && components.all(|c| matches!(c, Component::Normal(_)));
    plain.then_some(path)
}

/// Copy `<source>/<image_dir>` to `<output>/<image_dir>`, returning the
/// number of files copied. A missing image directory copies nothing.
pub fn copy_image_dir(
    source_dir: &Path,
    output_dir: &Path,
    image_dir: &str,
) -> Result<usize, AssetError> {
    let subdir = image_subdir(image_dir).ok_or_else(|| AssetError::ImageDir(image_dir.to_string()))?;
    let from = source_dir.join(subdir);
    if !from.is_dir() {
        return Ok(0);
    }
    let to = output_dir.join(subdir);
    let mut copied = 0;
    for entry in WalkDir::new(&from).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(&from) else {
            continue;
        };
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| AssetError::Copy {
                path: target.clone(),
                source,
            })?;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| AssetError::Copy {
                path: entry.path().to_path_buf(),
                source,
            })?;
            copied += 1;
        }
    }
    debug!(from = %from.display(), copied, "copied image directory");
    Ok(copied)
}
