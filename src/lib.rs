//! # Plaindoc
//!
//! A static site generator for documentation written as plain markdown.
//! Each document carries a small JSON front matter block naming its category
//! and position; everything else is ordinary CommonMark with GitHub
//! extensions.
//!
//! # Architecture: Two-Phase Parallel Build
//!
//! ```text
//! 1. Collect   docs/*.md  →  Vec<Page>       (front matter, title, URL)
//!              Vec<Page>  →  Vec<IndexItem>  (categories and pages, ordered)
//! 2. Render    every page, index.html, rss.xml, app.css, images/  →  dist/
//! ```
//!
//! Phase 2 needs the full index because every page embeds the index menu, so
//! it starts only after every document of phase 1 has been read without
//! error. Within each phase, work runs in parallel on a rayon pool and the
//! first failure cancels whatever has not started yet
//! (see [`pipeline::TaskGroup`]).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrates a build: phases, cancellation, build state |
//! | [`scan`] | Discovers documents under the source directory |
//! | [`meta`] | Splits front matter from the body and validates it |
//! | [`category`] | Category name → display order lookup |
//! | [`page`] | Builds `Page` records and renders documents to HTML files |
//! | [`markdown`] | Markdown rendering, heading anchors, header list, description |
//! | [`index`] | Aggregates pages into the ordered index, menu, and index page |
//! | [`layout`] | HTML layout placeholders and sanitizing |
//! | [`feed`] | RSS feed of recently dated pages |
//! | [`assets`] | Versioned stylesheet and image directory copy |
//! | [`imaging`] | Image dimension probing for `<img>` tags |
//! | [`collections`] | Bounded sorted collection used by the feed |
//! | [`config`] | `plaindoc.toml` loading, stock defaults, validation |
//! | [`types`] | Shared records (`Page`, `Meta`, `IndexItem`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Configuration
//!
//! The resolved [`config::SiteConfig`] is passed to every component. Nothing
//! reads environment variables; `RUST_LOG` only controls log filtering.
//!
//! ## Sanitized Layout Values
//!
//! Layouts are trusted HTML files with `__TITLE__`-style placeholders. Every
//! value substituted into them (rendered markdown included) goes through a
//! [`layout::Sanitizer`] first.

pub mod assets;
pub mod category;
pub mod collections;
pub mod config;
pub mod feed;
pub mod imaging;
pub mod index;
pub mod layout;
pub mod markdown;
pub mod meta;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
