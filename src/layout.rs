//! Layout templates and HTML sanitization.
//!
//! A layout is an HTML file with placeholders:
//!
//! | Placeholder | Value | Replaced |
//! |---|---|---|
//! | `__TITLE__` | page title | every occurrence |
//! | `__DESCRIPTION__` | page description | every occurrence |
//! | `__URL__` | page URL | first occurrence |
//! | `__CSS__` | versioned stylesheet URL | first occurrence |
//! | `__INDEX__` | index menu fragment | first occurrence |
//! | `__HEADER__` | in-page header list | first occurrence |
//! | `__BODY__` | rendered markdown | first occurrence |
//!
//! Every value passes through a [`Sanitizer`] before substitution. Title and
//! description usually end up inside attributes (`<meta content="…">`), so
//! double quotes in them are additionally encoded.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const TITLE: &str = "__TITLE__";
pub const DESCRIPTION: &str = "__DESCRIPTION__";
pub const URL: &str = "__URL__";
pub const CSS: &str = "__CSS__";
pub const INDEX: &str = "__INDEX__";
pub const HEADER: &str = "__HEADER__";
pub const BODY: &str = "__BODY__";

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Failed to read layout {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Cleans untrusted HTML before it is placed into a layout.
pub trait Sanitizer: Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// UGC-style policy: formatting, links, images, tables, and lists, plus the
/// attributes and class names the generated markup relies on.
pub struct AmmoniaSanitizer {
    builder: ammonia::Builder<'static>,
}

impl AmmoniaSanitizer {
    pub fn new() -> Self {
        let mut builder = ammonia::Builder::default();
        builder
            .link_rel(None)
            .add_tags(["nav", "details", "summary"])
            .add_tag_attributes("img", ["loading", "width", "height"])
            .add_tag_attributes("details", ["open"])
            .add_allowed_classes("a", ["anchor", "Link"])
            .add_allowed_classes("nav", ["index-menu", "header-list"])
            .add_allowed_classes("p", ["h1", "h2", "h3", "h4", "h5"]);
        for heading in ["h1", "h2", "h3", "h4", "h5", "h6"] {
            builder.add_tag_attributes(heading, ["id"]);
        }
        Self { builder }
    }
}

impl Default for AmmoniaSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

/// Values substituted into a layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct Placeholders<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub url: &'a str,
    pub css: &'a str,
    pub index: &'a str,
    pub header: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone)]
pub struct Layout {
    template: String,
}

impl Layout {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, LayoutError> {
        let template = fs::read_to_string(path).map_err(|source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(template))
    }

    pub fn apply(&self, values: &Placeholders<'_>, sanitizer: &dyn Sanitizer) -> String {
        let attribute = |value: &str| sanitizer.sanitize(value).replace('"', "&quot;");
        self.template
            .replace(TITLE, &attribute(values.title))
            .replace(DESCRIPTION, &attribute(values.description))
            .replacen(URL, &sanitizer.sanitize(values.url), 1)
            .replacen(CSS, &sanitizer.sanitize(values.css), 1)
            .replacen(INDEX, &sanitizer.sanitize(values.index), 1)
            .replacen(HEADER, &sanitizer.sanitize(values.header), 1)
            .replacen(BODY, &sanitizer.sanitize(values.body), 1)
    }
}
