//! Shared test utilities.
//!
//! Builders for in-memory [`Page`] records and writers for on-disk documents
//! and layouts, so module tests can set up a site in a few lines:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_layouts(tmp.path());
//! write_doc(&tmp.path().join("docs"), "intro.md", "Intro", 1, "", "# Intro");
//! let config = site_config(tmp.path(), "Intro");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::config::SiteConfig;
use crate::types::{Category, Meta, Page};

/// Minimal page layout using every placeholder.
pub const PAGE_LAYOUT: &str = "<title>__TITLE__</title>\n\
<meta name=\"description\" content=\"__DESCRIPTION__\">\n\
<link rel=\"canonical\" href=\"__URL__\">\n\
<link rel=\"stylesheet\" href=\"__CSS__\">\n\
__INDEX__\n__HEADER__\n<main>__BODY__</main>\n";

/// Minimal index layout; the index page has no menu or header list.
pub const INDEX_LAYOUT: &str = "<title>__TITLE__</title>\n\
<link rel=\"stylesheet\" href=\"__CSS__\">\n\
<main>__BODY__</main>\n";

// =========================================================================
// Records
// =========================================================================

pub fn page(category: &str, category_order: i64, order: i64, title: &str, url: &str) -> Page {
    Page {
        meta: Meta {
            category: Category {
                name: category.to_string(),
                order: category_order,
            },
            order,
            date: String::new(),
        },
        title: title.to_string(),
        url: url.to_string(),
    }
}

/// A page in category `A` with a unique order, for feed tests.
pub fn dated_page(url: &str, date: &str) -> Page {
    static NEXT_ORDER: AtomicI64 = AtomicI64::new(0);
    let mut page = page("A", 0, NEXT_ORDER.fetch_add(1, Ordering::Relaxed), "Title", url);
    page.meta.date = date.to_string();
    page
}

// =========================================================================
// Files
// =========================================================================

/// Front matter for a document; `date` is omitted when empty.
pub fn front_matter(category: &str, order: i64, date: &str) -> String {
    let mut json = serde_json::json!({ "category": category, "order": order });
    if !date.is_empty() {
        json["date"] = serde_json::Value::from(date);
    }
    json.to_string()
}

/// Write `<root>/<rel>` as front matter, separator, and body.
pub fn write_doc(root: &Path, rel: &str, category: &str, order: i64, date: &str, body: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, format!("{}\n---\n{body}", front_matter(category, order, date))).unwrap();
    path
}

/// Write `layouts/page.html` and `layouts/index.html` under `root`.
pub fn write_layouts(root: &Path) {
    let dir = root.join("layouts");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("page.html"), PAGE_LAYOUT).unwrap();
    fs::write(dir.join("index.html"), INDEX_LAYOUT).unwrap();
}

/// Config rooted at `root`: `docs/` in, `dist/` out, layouts from
/// [`write_layouts`].
pub fn site_config(root: &Path, categories: &str) -> SiteConfig {
    SiteConfig {
        source_dir: root.join("docs"),
        output_dir: root.join("dist"),
        base_url: "https://docs.example".to_string(),
        categories: categories.to_string(),
        page_layout: root.join("layouts/page.html"),
        index_page_layout: root.join("layouts/index.html"),
        ..SiteConfig::default()
    }
}
