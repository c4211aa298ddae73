//! Build orchestration.
//!
//! A build runs in two parallel phases on the rayon pool:
//!
//! ```text
//! recreate output dir → discover documents
//!   → phase 1: build every Page in parallel (skipped in single-page mode)
//!   → aggregate index → index menu → read page layout
//!   → phase 2, concurrently:
//!        feed (if enabled) │ every page's HTML │ image copy │ index.html │ app.css
//! ```
//!
//! Phase 2 starts only after every page of phase 1 succeeded, because each
//! page embeds the complete index menu.
//!
//! ## Failure and cancellation
//!
//! Each phase runs its tasks through a [`TaskGroup`]. The first task error is
//! kept and cancels the shared [`CancelToken`]; tasks that have not started
//! yet see the cancelled token and skip. Tasks already running finish (a large
//! image copy is not interrupted) but their outcome no longer matters. The
//! CLI cancels the same token on Ctrl-C.
//!
//! Phase 1 writes each page into its own pre-sized slot, indexed by the
//! document's position, so no lock is needed and the result does not depend
//! on completion order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::assets::{self, AssetError};
use crate::category::CategoryIndex;
use crate::config::{ConfigError, SiteConfig};
use crate::feed::{self, FeedError, FeedSettings};
use crate::imaging::ImageProbe;
use crate::index::{self, IndexError};
use crate::layout::{Layout, LayoutError, Placeholders, Sanitizer};
use crate::markdown::Renderer;
use crate::page::{self, PageError, RenderContext};
use crate::scan::{self, ScanError};
use crate::types::{IndexItem, Page};

pub const INDEX_FILE_NAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Page error: {0}")]
    Page(#[from] PageError),
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("Failed to write {path}: {source}")]
    Output { path: PathBuf, source: io::Error },
    #[error("Build cancelled")]
    Cancelled,
    #[error("Builder already used (state: {0:?})")]
    AlreadyRun(BuildState),
}

/// Cooperative cancellation flag shared by every task of a build.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fail-fast group of tasks: the first error wins and cancels the rest.
pub struct TaskGroup {
    cancel: CancelToken,
    first_error: Mutex<Option<BuildError>>,
}

impl TaskGroup {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            first_error: Mutex::new(None),
        }
    }

    /// Run `task` unless the group is already cancelled.
    pub fn run<F>(&self, task: F)
    where
        F: FnOnce() -> Result<(), BuildError>,
    {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Err(err) = task() {
            self.fail(err);
        }
    }

    fn fail(&self, err: BuildError) {
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
        self.cancel.cancel();
    }

    /// The first recorded error; [`BuildError::Cancelled`] if the token was
    /// cancelled from outside without any task failing.
    pub fn finish(self) -> Result<(), BuildError> {
        let first = self
            .first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        match first {
            Some(err) => Err(err),
            None if self.cancel.is_cancelled() => Err(BuildError::Cancelled),
            None => Ok(()),
        }
    }
}

/// Lifecycle of a [`SiteBuilder`]. A builder runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// What a successful build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub documents: usize,
    pub pages: Vec<Page>,
    pub index: Vec<IndexItem>,
    /// Items in the feed, `None` when the feed is disabled.
    pub feed_items: Option<usize>,
    pub images_copied: usize,
    /// Every HTML file written, sorted.
    pub written: Vec<PathBuf>,
}

/// Result of `check`: pages and index without any output.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub documents: usize,
    pub pages: Vec<Page>,
    pub index: Vec<IndexItem>,
}

pub struct SiteBuilder<'a> {
    config: &'a SiteConfig,
    probe: &'a dyn ImageProbe,
    sanitizer: &'a dyn Sanitizer,
    cancel: CancelToken,
    state: BuildState,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(config: &'a SiteConfig, probe: &'a dyn ImageProbe, sanitizer: &'a dyn Sanitizer) -> Self {
        Self {
            config,
            probe,
            sanitizer,
            cancel: CancelToken::new(),
            state: BuildState::Idle,
        }
    }

    /// Use an externally owned token, e.g. one cancelled by a signal handler.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Run the full build once.
    pub fn run(&mut self) -> Result<BuildReport, BuildError> {
        if self.state != BuildState::Idle {
            return Err(BuildError::AlreadyRun(self.state));
        }
        self.state = BuildState::Running;
        let result = self.build();
        self.state = if result.is_ok() {
            BuildState::Succeeded
        } else {
            BuildState::Failed
        };
        result
    }

    /// Discover documents, build pages, and aggregate the index without
    /// writing anything. Does not consume the builder.
    pub fn check(&self) -> Result<CheckReport, BuildError> {
        self.config.validate()?;
        let documents = scan::discover(&self.config.source_dir, &self.config.document_suffix)?;
        let pages = self.build_pages(&documents)?;
        let index = index::aggregate(&pages)?;
        Ok(CheckReport {
            documents: documents.len(),
            pages,
            index,
        })
    }

    fn build(&self) -> Result<BuildReport, BuildError> {
        let config = self.config;
        let source = config.source_dir.as_path();
        let output = config.output_dir.as_path();
        let base_url = config.base_url();

        config.validate()?;
        prepare_output_dir(output, source)?;
        let documents = scan::discover(source, &config.document_suffix)?;
        info!(count = documents.len(), source = %source.display(), "discovered documents");

        let pages = if config.single_page {
            Vec::new()
        } else {
            self.build_pages(&documents)?
        };
        let index_items = index::aggregate(&pages)?;
        let index_menu = index::index_menu(&index_items);
        let layout = Layout::read(&config.page_layout)?;
        let css_href = assets::css_href(base_url);
        let renderer = Renderer::new(source, config.image_dir(), self.probe);
        let ctx = RenderContext {
            source_root: source,
            output_root: output,
            base_url,
            css_href: &css_href,
            index_menu: &index_menu,
            layout: &layout,
            renderer: &renderer,
            sanitizer: self.sanitizer,
        };

        info!(pages = documents.len(), "rendering site");
        let group = TaskGroup::new(self.cancel.clone());
        let mut feed_items = None;
        let mut images_copied = 0;
        let mut written_pages: Vec<Option<PathBuf>> = vec![None; documents.len()];
        let mut index_page = None;
        rayon::scope(|s| {
            if config.feed.enabled {
                let feed_items = &mut feed_items;
                let pages = &pages;
                let group = &group;
                s.spawn(move |_| {
                    group.run(|| {
                        let written = feed::write_feed(
                            pages,
                            &FeedSettings {
                                time_zone: &config.feed.time_zone,
                                output_dir: output,
                                base_url,
                                title: &config.index_page.title,
                                description: &config.index_page.description,
                            },
                        )?;
                        debug!(items = written.items, "wrote feed");
                        *feed_items = Some(written.items);
                        Ok(())
                    })
                });
            }
            s.spawn(|_| {
                written_pages
                    .par_iter_mut()
                    .zip(documents.par_iter())
                    .for_each(|(slot, path)| {
                        group.run(|| {
                            *slot = Some(page::render_page(path, &ctx)?);
                            Ok(())
                        })
                    });
            });
            s.spawn(|_| {
                group.run(|| {
                    images_copied = assets::copy_image_dir(source, output, config.image_dir())?;
                    Ok(())
                })
            });
            if !config.single_page {
                s.spawn(|_| {
                    group.run(|| {
                        index_page = Some(self.write_index_page(&index_items, &css_href)?);
                        Ok(())
                    })
                });
            }
            s.spawn(|_| {
                group.run(|| {
                    assets::write_stylesheet(output)?;
                    Ok(())
                })
            });
        });
        group.finish()?;

        let mut written: Vec<PathBuf> = written_pages.into_iter().flatten().collect();
        written.extend(index_page);
        written.sort();
        info!(files = written.len(), output = %output.display(), "build complete");

        Ok(BuildReport {
            output_dir: output.to_path_buf(),
            documents: documents.len(),
            pages,
            index: index_items,
            feed_items,
            images_copied,
            written,
        })
    }

    /// Phase 1: one [`Page`] per document, in document order.
    fn build_pages(&self, documents: &[PathBuf]) -> Result<Vec<Page>, BuildError> {
        let categories = CategoryIndex::parse(&self.config.categories);
        let source = self.config.source_dir.as_path();
        let base_url = self.config.base_url();

        let group = TaskGroup::new(self.cancel.clone());
        let mut slots: Vec<Option<Page>> = vec![None; documents.len()];
        slots
            .par_iter_mut()
            .zip(documents.par_iter())
            .for_each(|(slot, path)| {
                group.run(|| {
                    *slot = Some(page::build_page(path, source, base_url, &categories)?);
                    Ok(())
                })
            });
        group.finish()?;

        let pages: Option<Vec<Page>> = slots.into_iter().collect();
        pages.ok_or(BuildError::Cancelled)
    }

    fn write_index_page(&self, items: &[IndexItem], css_href: &str) -> Result<PathBuf, BuildError> {
        let config = self.config;
        let layout = Layout::read(&config.index_page_layout)?;
        let renderer = Renderer::new(&config.source_dir, config.image_dir(), self.probe);
        let body = renderer.render(&index::index_markdown(&config.index_page.header, items));
        let html = layout.apply(
            &Placeholders {
                title: &config.index_page.title,
                description: &config.index_page.description,
                url: config.base_url(),
                css: css_href,
                body: &body,
                ..Default::default()
            },
            self.sanitizer,
        );
        let path = config.output_dir.join(INDEX_FILE_NAME);
        fs::write(&path, html).map_err(|source| BuildError::Output {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Remove any previous output and create an empty output directory.
///
/// Refuses to remove a directory that is or contains the source directory,
/// comparing resolved paths so `./docs`, `/abs/docs`, and symlinks agree.
fn prepare_output_dir(output: &Path, source: &Path) -> Result<(), BuildError> {
    let err = |source| BuildError::Output {
        path: output.to_path_buf(),
        source,
    };
    if output.exists() {
        if let (Ok(out), Ok(src)) = (output.canonicalize(), source.canonicalize()) {
            if src.starts_with(&out) {
                return Err(ConfigError::Validation(format!(
                    "output_dir {} must not be or contain source_dir {}",
                    output.display(),
                    source.display()
                ))
                .into());
            }
        }
        fs::remove_dir_all(output).map_err(err)?;
    }
    fs::create_dir_all(output).map_err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockProbe;
    use crate::layout::tests::PassThrough;
    use crate::test_helpers::{site_config, write_doc, write_layouts};
    use tempfile::TempDir;

    #[test]
    fn task_group_keeps_first_error_and_skips_later_tasks() {
        let group = TaskGroup::new(CancelToken::new());
        group.run(|| Ok(()));
        group.run(|| Err(BuildError::Cancelled));
        let mut ran = false;
        group.run(|| {
            ran = true;
            Err(BuildError::AlreadyRun(BuildState::Idle))
        });
        assert!(!ran);
        assert!(matches!(group.finish(), Err(BuildError::Cancelled)));
    }

    #[test]
    fn task_group_reports_external_cancellation() {
        let token = CancelToken::new();
        let group = TaskGroup::new(token.clone());
        token.cancel();
        let mut ran = false;
        group.run(|| {
            ran = true;
            Ok(())
        });
        assert!(!ran);
        assert!(matches!(group.finish(), Err(BuildError::Cancelled)));
    }

    #[test]
    fn task_group_ok_when_all_succeed() {
        let group = TaskGroup::new(CancelToken::new());
        (0..100).into_par_iter().for_each(|_| group.run(|| Ok(())));
        assert!(group.finish().is_ok());
    }

    #[test]
    fn builder_runs_once() {
        let tmp = TempDir::new().unwrap();
        write_layouts(tmp.path());
        write_doc(&tmp.path().join("docs"), "a.md", "A", 1, "", "# A");
        let config = site_config(tmp.path(), "A");
        let probe = MockProbe::new();

        let mut builder = SiteBuilder::new(&config, &probe, &PassThrough);
        assert_eq!(builder.state(), BuildState::Idle);
        builder.run().unwrap();
        assert_eq!(builder.state(), BuildState::Succeeded);
        assert!(matches!(
            builder.run(),
            Err(BuildError::AlreadyRun(BuildState::Succeeded))
        ));
    }

    #[test]
    fn failing_document_fails_the_build() {
        let tmp = TempDir::new().unwrap();
        write_layouts(tmp.path());
        write_doc(&tmp.path().join("docs"), "a.md", "A", 1, "", "# A");
        write_doc(&tmp.path().join("docs"), "b.md", "Unknown", 1, "", "# B");
        let config = site_config(tmp.path(), "A");
        let probe = MockProbe::new();

        let mut builder = SiteBuilder::new(&config, &probe, &PassThrough);
        let err = builder.run().unwrap_err();
        assert!(matches!(err, BuildError::Page(PageError::Meta { .. })));
        assert_eq!(builder.state(), BuildState::Failed);
        // Renders never started.
        assert!(!tmp.path().join("dist/a.html").exists());
    }

    #[test]
    fn pre_cancelled_build_is_cancelled() {
        let tmp = TempDir::new().unwrap();
        write_layouts(tmp.path());
        write_doc(&tmp.path().join("docs"), "a.md", "A", 1, "", "# A");
        let config = site_config(tmp.path(), "A");
        let probe = MockProbe::new();
        let token = CancelToken::new();
        token.cancel();

        let mut builder = SiteBuilder::new(&config, &probe, &PassThrough).with_cancel(token);
        assert!(matches!(builder.run(), Err(BuildError::Cancelled)));
    }

    #[test]
    fn duplicate_page_order_fails_before_rendering() {
        let tmp = TempDir::new().unwrap();
        write_layouts(tmp.path());
        let docs = tmp.path().join("docs");
        write_doc(&docs, "a.md", "A", 1, "", "# A");
        write_doc(&docs, "b.md", "A", 1, "", "# B");
        let config = site_config(tmp.path(), "A");
        let probe = MockProbe::new();

        let err = SiteBuilder::new(&config, &probe, &PassThrough).run().unwrap_err();
        assert!(matches!(err, BuildError::Index(IndexError::DuplicatePageOrder { .. })));
    }

    #[test]
    fn single_page_mode_skips_index_and_front_matter() {
        let tmp = TempDir::new().unwrap();
        write_layouts(tmp.path());
        let docs = tmp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("only.md"), "anything at all\n---\n# Only\n\nBody").unwrap();
        let mut config = site_config(tmp.path(), "");
        config.single_page = true;
        let probe = MockProbe::new();

        let report = SiteBuilder::new(&config, &probe, &PassThrough).run().unwrap();
        assert!(report.pages.is_empty());
        assert!(report.index.is_empty());
        assert_eq!(report.written, vec![tmp.path().join("dist/only.html")]);
        assert!(!tmp.path().join("dist/index.html").exists());
        let html = fs::read_to_string(tmp.path().join("dist/only.html")).unwrap();
        assert!(html.contains("<nav class=\"index-menu\">\n</nav>"));
    }

    #[test]
    fn output_dir_is_recreated() {
        let tmp = TempDir::new().unwrap();
        write_layouts(tmp.path());
        write_doc(&tmp.path().join("docs"), "a.md", "A", 1, "", "# A");
        let stale = tmp.path().join("dist/stale.html");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();
        let config = site_config(tmp.path(), "A");
        let probe = MockProbe::new();

        SiteBuilder::new(&config, &probe, &PassThrough).run().unwrap();
        assert!(!stale.exists());
        assert!(tmp.path().join("dist/a.html").exists());
        assert!(tmp.path().join("dist/app.css").exists());
    }

    #[test]
    fn output_dir_holding_the_sources_is_never_removed() {
        let tmp = TempDir::new().unwrap();
        write_layouts(tmp.path());
        let doc = write_doc(&tmp.path().join("docs"), "a.md", "A", 1, "", "# A");
        let mut config = site_config(tmp.path(), "A");
        // Same directory spelled differently, so only the resolved paths match.
        config.output_dir = tmp.path().join("docs/../docs");
        let probe = MockProbe::new();

        let err = SiteBuilder::new(&config, &probe, &PassThrough).run().unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::Validation(_))));
        assert!(doc.is_file());

        config.output_dir = tmp.path().to_path_buf();
        let err = SiteBuilder::new(&config, &probe, &PassThrough).run().unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::Validation(_))));
        assert!(doc.is_file());
    }

    #[test]
    fn invalid_config_fails_before_touching_output() {
        let tmp = TempDir::new().unwrap();
        write_layouts(tmp.path());
        write_doc(&tmp.path().join("docs"), "a.md", "A", 1, "", "# A");
        let keep = tmp.path().join("dist/keep.html");
        fs::create_dir_all(keep.parent().unwrap()).unwrap();
        fs::write(&keep, "old").unwrap();
        let mut config = site_config(tmp.path(), "A");
        config.image_dir = "/images".to_string();
        let probe = MockProbe::new();

        let mut builder = SiteBuilder::new(&config, &probe, &PassThrough);
        assert!(matches!(builder.run(), Err(BuildError::Config(ConfigError::Validation(_)))));
        assert_eq!(builder.state(), BuildState::Failed);
        assert!(keep.exists());
        assert!(SiteBuilder::new(&config, &probe, &PassThrough).check().is_err());
    }

    #[test]
    fn check_reports_index_without_writing() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        write_doc(&docs, "b.md", "B", 1, "", "# B one");
        write_doc(&docs, "a.md", "A", 1, "", "# A one");
        let config = site_config(tmp.path(), "A,B");
        let probe = MockProbe::new();

        let report = SiteBuilder::new(&config, &probe, &PassThrough).check().unwrap();
        assert_eq!(report.documents, 2);
        let names: Vec<_> = report.index.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(!tmp.path().join("dist").exists());
    }
}
