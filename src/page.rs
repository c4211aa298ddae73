//! Per-document page construction and rendering.
//!
//! Two passes touch every document. [`build_page`] reads it once to collect
//! its [`Page`] record (metadata, title, URL) for the index and feed.
//! [`render_page`] reads it again after the index exists and writes the final
//! HTML, which embeds the index menu.
//!
//! Paths map to URLs and output files by their position under the source root:
//!
//! ```text
//! docs/intro.md            →  <base>/intro.html            dist/intro.html
//! docs/guide/install.md    →  <base>/guide/install.html    dist/guide/install.html
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::category::CategoryIndex;
use crate::layout::{Layout, Placeholders, Sanitizer};
use crate::markdown::{self, Renderer};
use crate::meta::{self, MetaError};
use crate::types::Page;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Invalid document {path}: {source}")]
    Meta { path: PathBuf, source: MetaError },
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Title from a leading `# ` line, or empty.
pub fn create_title(md: &str) -> String {
    md.lines()
        .next()
        .and_then(|line| line.strip_prefix("# "))
        .unwrap_or_default()
        .to_string()
}

/// Split a document path into its directory and file stem.
pub fn dir_and_stem(path: &Path) -> (PathBuf, String) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, stem)
}

/// `dir` relative to `source_root`, `/`-separated, without surrounding slashes.
pub fn relative_dir(dir: &Path, source_root: &Path) -> String {
    let relative = dir.strip_prefix(source_root).unwrap_or(dir);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn create_url(dir: &Path, stem: &str, source_root: &Path, base_url: &str) -> String {
    let rel = relative_dir(dir, source_root);
    if rel.is_empty() {
        format!("{base_url}/{stem}.html")
    } else {
        format!("{base_url}/{rel}/{stem}.html")
    }
}

/// Output directory mirroring `dir` under `output_root`.
pub fn html_file_dir(dir: &Path, source_root: &Path, output_root: &Path) -> PathBuf {
    let rel = relative_dir(dir, source_root);
    if rel.is_empty() {
        output_root.to_path_buf()
    } else {
        output_root.join(rel)
    }
}

fn read_document(path: &Path) -> Result<String, PageError> {
    fs::read_to_string(path).map_err(|source| PageError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a document and derive its [`Page`] record.
pub fn build_page(
    path: &Path,
    source_root: &Path,
    base_url: &str,
    categories: &CategoryIndex,
) -> Result<Page, PageError> {
    let content = read_document(path)?;
    let (meta, md) = meta::extract(&content, categories).map_err(|source| PageError::Meta {
        path: path.to_path_buf(),
        source,
    })?;
    let title = create_title(&md);
    let (dir, stem) = dir_and_stem(path);
    let url = create_url(&dir, &stem, source_root, base_url);
    debug!(path = %path.display(), %url, category = %meta.category.name, order = meta.order, "page");
    Ok(Page { meta, title, url })
}

/// Everything a page render needs besides the document itself.
pub struct RenderContext<'a> {
    pub source_root: &'a Path,
    pub output_root: &'a Path,
    pub base_url: &'a str,
    pub css_href: &'a str,
    pub index_menu: &'a str,
    pub layout: &'a Layout,
    pub renderer: &'a Renderer<'a>,
    pub sanitizer: &'a dyn Sanitizer,
}

/// Complete HTML for one markdown body.
pub fn page_html(md: &str, url: &str, ctx: &RenderContext<'_>) -> String {
    let title = create_title(md);
    let header = markdown::header_list(md);
    let body = ctx.renderer.render(md);
    let description = markdown::description(md);
    ctx.layout.apply(
        &Placeholders {
            title: &title,
            description: &description,
            url,
            css: ctx.css_href,
            index: ctx.index_menu,
            header: &header,
            body: &body,
        },
        ctx.sanitizer,
    )
}

/// Render a document to `<output>/<rel>/<stem>.html` and return that path.
///
/// Only the body is needed, so this also works for documents whose front
/// matter was never validated (single-page mode).
pub fn render_page(path: &Path, ctx: &RenderContext<'_>) -> Result<PathBuf, PageError> {
    let content = read_document(path)?;
    let md = meta::body(&content).map_err(|source| PageError::Meta {
        path: path.to_path_buf(),
        source,
    })?;
    let (dir, stem) = dir_and_stem(path);
    let url = create_url(&dir, &stem, ctx.source_root, ctx.base_url);
    let html = page_html(&md, &url, ctx);

    let out_dir = html_file_dir(&dir, ctx.source_root, ctx.output_root);
    fs::create_dir_all(&out_dir).map_err(|source| PageError::Write {
        path: out_dir.clone(),
        source,
    })?;
    let out_path = out_dir.join(format!("{stem}.html"));
    fs::write(&out_path, html).map_err(|source| PageError::Write {
        path: out_path.clone(),
        source,
    })?;
    debug!(path = %out_path.display(), "wrote page");
    Ok(out_path)
}
