//! CLI output formatting.
//!
//! Output is an inventory of the site as readers will see it: categories in
//! menu order, each with its pages and their URLs. Files written are listed
//! relative to the output directory.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Index
//! 001 Guide
//!     001 Install → https://docs.example/guide/install.html
//!     002 Usage → https://docs.example/guide/usage.html
//! 002 Reference
//!     001 Config → https://docs.example/config.html
//!
//! Written
//!     config.html
//!     guide/install.html
//!     guide/usage.html
//!     index.html
//!
//! Feed: 2 items → rss.xml
//! Images: 4 copied
//! Built 3 documents into dist
//! ```
//!
//! ## Check
//!
//! ```text
//! Index
//! 001 Guide
//!     001 Install → https://docs.example/guide/install.html
//!
//! Checked 1 document in 1 category
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use std::path::Path;

use crate::feed::FEED_FILE_NAME;
use crate::pipeline::{BuildReport, CheckReport};
use crate::types::IndexItem;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Categories in menu order, each followed by its pages.
///
/// ```text
/// Index
/// 001 Guide
///     001 Install → https://docs.example/guide/install.html
/// ```
fn index_lines(items: &[IndexItem]) -> Vec<String> {
    let mut lines = vec!["Index".to_string()];
    for (i, item) in items.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), item.name));
        for (j, page) in item.pages.iter().enumerate() {
            lines.push(format!(
                "{}{} {} \u{2192} {}",
                indent(1),
                format_index(j + 1),
                page.title,
                page.url
            ));
        }
    }
    lines
}

fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.index.is_empty() {
        lines.extend(index_lines(&report.index));
        lines.push(String::new());
    }

    if !report.written.is_empty() {
        lines.push("Written".to_string());
        for path in &report.written {
            lines.push(format!(
                "{}{}",
                indent(1),
                relative_display(path, &report.output_dir)
            ));
        }
        lines.push(String::new());
    }

    if let Some(items) = report.feed_items {
        lines.push(format!(
            "Feed: {} \u{2192} {}",
            plural(items, "item", "items"),
            FEED_FILE_NAME
        ));
    }
    if report.images_copied > 0 {
        lines.push(format!("Images: {} copied", report.images_copied));
    }
    lines.push(format!(
        "Built {} into {}",
        plural(report.documents, "document", "documents"),
        report.output_dir.display()
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = index_lines(&report.index);
    lines.push(String::new());
    lines.push(format!(
        "Checked {} in {}",
        plural(report.documents, "document", "documents"),
        plural(report.index.len(), "category", "categories")
    ));
    lines
}

/// The aggregated index as pretty-printed JSON.
pub fn format_check_json(report: &CheckReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&report.index)
}

/// Print check output to stdout.
pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
