//! Shared types flowing between the page, index, and feed stages.
//!
//! Pages are built once per document and never mutated afterwards; the index
//! is derived from the complete page set. All types serialize to JSON so the
//! `check --json` command can dump them.

use serde::{Deserialize, Serialize};

/// A category with its display position, resolved from the configured list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub order: i64,
}

/// Front-matter metadata of a document after category resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub category: Category,
    /// Position of the page inside its category.
    pub order: i64,
    /// Publication date in `YYYY-MM-DD HH:MM` form, empty when absent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date: String,
}

/// A processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub meta: Meta,
    /// Text of the leading `# ` line, empty when the body has none.
    pub title: String,
    /// Absolute URL of the generated HTML file.
    pub url: String,
}

/// One category of the index with its pages in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexItem {
    pub name: String,
    pub pages: Vec<IndexItemPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexItemPage {
    pub title: String,
    pub url: String,
}
