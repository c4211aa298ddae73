//! Site configuration.
//!
//! Configuration lives in a single `plaindoc.toml` (path from `--config`).
//! User values are merged over the stock defaults, so the file only needs the
//! keys it wants to change. A missing file means "all defaults".
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_dir = "docs"                   # Markdown documents
//! output_dir = "dist"                   # Generated site (recreated each build)
//! base_url = ""                         # Prefix of every generated URL
//! categories = ""                       # Ordered, comma-separated category names
//! single_page = false                   # Render pages only: no index, no menu
//! page_layout = "layouts/page.html"
//! index_page_layout = "layouts/index.html"
//! document_suffix = ".md"
//! image_dir = "images"                  # Copied verbatim; images here get sized
//!
//! [index_page]
//! title = ""
//! description = ""
//! header = ""                           # Level-1 heading of index.html
//!
//! [feed]
//! enabled = false
//! time_zone = "UTC"                     # IANA name used for feed dates
//!
//! [build]
//! max_workers = 4                       # Omit for auto = CPU cores
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::assets;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `plaindoc.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Prefix of every generated URL. Surrounding slashes are ignored.
    pub base_url: String,
    /// Comma-separated category names; list position is display order.
    pub categories: String,
    /// Render every document but skip the index page and index menu.
    pub single_page: bool,
    pub page_layout: PathBuf,
    pub index_page_layout: PathBuf,
    pub document_suffix: String,
    /// Directory under the source root holding images.
    pub image_dir: String,
    pub index_page: IndexPageConfig,
    pub feed: FeedConfig,
    pub build: BuildConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("docs"),
            output_dir: PathBuf::from("dist"),
            base_url: String::new(),
            categories: String::new(),
            single_page: false,
            page_layout: PathBuf::from("layouts/page.html"),
            index_page_layout: PathBuf::from("layouts/index.html"),
            document_suffix: ".md".to_string(),
            image_dir: "images".to_string(),
            index_page: IndexPageConfig::default(),
            feed: FeedConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl SiteConfig {
    /// `base_url` without leading or trailing slashes.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_matches('/')
    }

    /// Replace the source and output directories, then validate again.
    pub fn with_dirs(
        mut self,
        source_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let Some(source_dir) = source_dir {
            self.source_dir = source_dir;
        }
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
        self.validate()?;
        Ok(self)
    }

    /// `image_dir` without trailing slashes.
    pub fn image_dir(&self) -> &str {
        self.image_dir.trim_end_matches('/')
    }

    /// Validate config values are within acceptable ranges.
    ///
    /// Call again after changing fields, e.g. after command-line overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.document_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "document_suffix must not be empty".into(),
            ));
        }
        if assets::image_subdir(&self.image_dir).is_none() {
            return Err(ConfigError::Validation(format!(
                "image_dir must be a relative directory inside source_dir: {:?}",
                self.image_dir
            )));
        }
        // The output directory is deleted before every build.
        if without_cur_dir(&self.source_dir).starts_with(without_cur_dir(&self.output_dir)) {
            return Err(ConfigError::Validation(format!(
                "output_dir {} must not be or contain source_dir {}",
                self.output_dir.display(),
                self.source_dir.display()
            )));
        }
        if self.build.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "build.max_workers must be at least 1".into(),
            ));
        }
        if self.feed.enabled && self.feed.time_zone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::Validation(format!(
                "feed.time_zone is not a known IANA time zone: {}",
                self.feed.time_zone
            )));
        }
        Ok(())
    }
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Title, description, and heading of the generated `index.html`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexPageConfig {
    pub title: String,
    pub description: String,
    pub header: String,
}

/// RSS feed settings. The feed reuses the index page title and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub enabled: bool,
    pub time_zone: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time_zone: "UTC".to_string(),
        }
    }
}

/// Parallel build settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &BuildConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the config file at `path`, falling back to defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `plaindoc.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# plaindoc configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Directory containing the markdown documents.
source_dir = "docs"

# Directory the site is written to. It is deleted and recreated on every build.
output_dir = "dist"

# Prefix of every generated URL, e.g. "https://docs.example.com".
# Leading and trailing slashes are ignored.
base_url = ""

# Ordered, comma-separated category names. A document's front matter must
# name one of these; the position in this list is the display order.
categories = ""

# Render every document but skip the index page and the index menu.
# Front matter is not validated in this mode.
single_page = false

# Layout templates. Placeholders: __TITLE__, __DESCRIPTION__, __URL__,
# __CSS__, __INDEX__, __HEADER__, __BODY__.
page_layout = "layouts/page.html"
index_page_layout = "layouts/index.html"

# File name suffix of documents.
document_suffix = ".md"

# Image directory under source_dir. Copied to the output as-is; images
# referenced from documents under this directory get width/height attributes.
image_dir = "images"

# ---------------------------------------------------------------------------
# Index page
# ---------------------------------------------------------------------------
[index_page]
title = ""
description = ""
# Level-1 heading at the top of index.html.
header = ""

# ---------------------------------------------------------------------------
# RSS feed (rss.xml). Uses the index page title and description.
# ---------------------------------------------------------------------------
[feed]
enabled = false
# IANA time zone for displayed dates. Front-matter dates are read as UTC.
time_zone = "UTC"

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_workers = 4
"##
}
