//! Front-matter extraction.
//!
//! A document is a JSON object, a separator, and a markdown body:
//!
//! ```text
//! {"category": "Guide", "order": 2, "date": "2024-03-01 09:30"}
//! ---
//! # Installing
//!
//! Body text...
//! ```
//!
//! The separator is the first `---` in the file together with whatever follows
//! it on the same line. Everything before it is front matter; everything after
//! it, trimmed, is the body.

use serde::Deserialize;
use thiserror::Error;

use crate::category::CategoryIndex;
use crate::types::Meta;

const SEPARATOR: &str = "---";

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Missing front matter separator (---)")]
    MissingSeparator,
    #[error("Malformed front matter: {0}")]
    FrontMatter(#[from] serde_json::Error),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

#[derive(Debug, Deserialize)]
struct FrontMatter {
    category: String,
    order: i64,
    #[serde(default)]
    date: Option<String>,
}

/// Split a document into its raw front matter and trimmed body.
pub fn split(content: &str) -> Result<(&str, &str), MetaError> {
    let start = content.find(SEPARATOR).ok_or(MetaError::MissingSeparator)?;
    let front = &content[..start];
    let rest = &content[start..];
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline..],
        None => "",
    };
    Ok((front, body.trim()))
}

/// Parse the front matter and resolve its category.
pub fn extract(content: &str, categories: &CategoryIndex) -> Result<(Meta, String), MetaError> {
    let (front, body) = split(content)?;
    let front: FrontMatter = serde_json::from_str(front)?;
    let category = categories
        .resolve(&front.category)
        .ok_or(MetaError::UnknownCategory(front.category))?;
    let meta = Meta {
        category,
        order: front.order,
        date: front.date.unwrap_or_default(),
    };
    Ok((meta, body.to_string()))
}

/// The markdown body alone; the front matter is not parsed.
pub fn body(content: &str) -> Result<String, MetaError> {
    split(content).map(|(_, body)| body.to_string())
}
