//! Markdown rendering with anchored headings, classed links, and sized images.
//!
//! Rendering is plain `pulldown-cmark` with the event stream remapped by two
//! adapters before it reaches the HTML writer:
//!
//! | Node | Output |
//! |------|--------|
//! | Heading | `<hN id="ID"><a href="#ID">…</a></hN>`, ID = [`create_hash`] of the heading text |
//! | Link | `<a href="DEST" class="Link">…</a>` |
//! | Image | `<img src="DEST" alt="DEST">`, plus `loading="lazy"` and pixel size for local images |
//!
//! An image is local when its destination, after dropping any leading `../`
//! segments, starts with `<image_dir>/`. Its file is probed relative to the
//! source root. A failed probe is not an error: the image is emitted without
//! dimensions and a warning is logged.
//!
//! The module also derives the two text-only views of a document used by the
//! layout: the in-page header list and the page description.

use std::collections::VecDeque;
use std::path::PathBuf;

use maud::html;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html as cmark_html};
use tracing::warn;

use crate::imaging::ImageProbe;

/// Maximum description length in characters.
pub const DESCRIPTION_LIMIT: usize = 300;

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Slug used for heading ids and header-list links.
///
/// Whitespace and `?:&=%"'/@\` become `_`, then `<` becomes `-_` and `>`
/// becomes `_-`. Everything else, including non-ASCII text, is kept.
pub fn create_hash(text: &str) -> String {
    let mut hash = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            c if c.is_whitespace() => hash.push('_'),
            '?' | ':' | '&' | '=' | '%' | '"' | '\'' | '/' | '@' | '\\' => hash.push('_'),
            '<' => hash.push_str("-_"),
            '>' => hash.push_str("_-"),
            c => hash.push(c),
        }
    }
    hash
}

/// Markdown → HTML renderer for one site.
pub struct Renderer<'p> {
    source_root: PathBuf,
    image_dir: String,
    probe: &'p dyn ImageProbe,
}

impl<'p> Renderer<'p> {
    pub fn new(source_root: impl Into<PathBuf>, image_dir: &str, probe: &'p dyn ImageProbe) -> Self {
        Self {
            source_root: source_root.into(),
            image_dir: image_dir.trim_end_matches('/').to_string(),
            probe,
        }
    }

    pub fn render(&self, md: &str) -> String {
        let parser = Parser::new_ext(md, parser_options());
        let events = LinksAndImages {
            inner: HeadingAnchors::new(parser),
            renderer: self,
        };
        let mut out = String::with_capacity(md.len() * 3 / 2);
        cmark_html::push_html(&mut out, events);
        out
    }

    fn image_tag(&self, destination: &str) -> String {
        let src = html_escape::encode_double_quoted_attribute(destination);
        let plain = format!(r#"<img src="{src}" alt="{src}">"#);
        let Some(relative) = local_image_path(&self.image_dir, &src) else {
            return plain;
        };
        let path = self.source_root.join(relative);
        match self.probe.dimensions(&path) {
            Ok(dims) => format!(
                r#"<img loading="lazy" src="{src}" alt="{src}" width="{}" height="{}">"#,
                dims.width, dims.height
            ),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read image dimensions");
                plain
            }
        }
    }
}

/// The destination relative to the source root if it points into `image_dir`.
pub fn local_image_path<'d>(image_dir: &str, destination: &'d str) -> Option<&'d str> {
    let mut rest = destination;
    while let Some(stripped) = rest.strip_prefix("../") {
        rest = stripped;
    }
    rest.strip_prefix(image_dir)
        .filter(|after| after.starts_with('/'))
        .map(|_| rest)
}

/// Wraps every heading in an anchor pointing at its own id.
///
/// The heading body is buffered so its text is known before the opening tag
/// is emitted.
struct HeadingAnchors<'a, I> {
    inner: I,
    pending: VecDeque<Event<'a>>,
}

impl<'a, I> HeadingAnchors<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    fn new(inner: I) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
        }
    }
}

impl<'a, I> Iterator for HeadingAnchors<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        match self.inner.next()? {
            Event::Start(Tag::Heading { level, .. }) => {
                let level = level as usize;
                let mut text = TextCollector::default();
                for event in self.inner.by_ref() {
                    if matches!(event, Event::End(TagEnd::Heading(_))) {
                        break;
                    }
                    text.observe(&event);
                    self.pending.push_back(event);
                }
                let id = create_hash(&text.text);
                self.pending
                    .push_back(Event::Html(CowStr::from(format!("</a></h{level}>\n"))));
                Some(Event::Html(CowStr::from(format!(
                    r##"<h{level} id="{id}"><a href="#{id}">"##
                ))))
            }
            other => Some(other),
        }
    }
}

/// Classes links and replaces images (and their alt-text children) with a
/// single `<img>` tag.
struct LinksAndImages<'r, 'p, I> {
    inner: I,
    renderer: &'r Renderer<'p>,
}

impl<'a, I> Iterator for LinksAndImages<'_, '_, I>
where
    I: Iterator<Item = Event<'a>>,
{
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        match self.inner.next()? {
            Event::Start(Tag::Link { dest_url, .. }) => {
                let href = html_escape::encode_double_quoted_attribute(&dest_url);
                Some(Event::InlineHtml(CowStr::from(format!(
                    r#"<a href="{href}" class="Link">"#
                ))))
            }
            Event::End(TagEnd::Link) => Some(Event::InlineHtml(CowStr::Borrowed("</a>"))),
            Event::Start(Tag::Image { dest_url, .. }) => {
                let mut depth = 1usize;
                while depth > 0 {
                    match self.inner.next()? {
                        Event::Start(Tag::Image { .. }) => depth += 1,
                        Event::End(TagEnd::Image) => depth -= 1,
                        _ => {}
                    }
                }
                Some(Event::InlineHtml(CowStr::from(
                    self.renderer.image_tag(&dest_url),
                )))
            }
            other => Some(other),
        }
    }
}

/// Accumulates visible text: text and inline code, minus image alt text.
#[derive(Default)]
struct TextCollector {
    text: String,
    image_depth: usize,
}

impl TextCollector {
    fn observe(&mut self, event: &Event<'_>) {
        match event {
            Event::Start(Tag::Image { .. }) => self.image_depth += 1,
            Event::End(TagEnd::Image) => self.image_depth = self.image_depth.saturating_sub(1),
            Event::Text(t) | Event::Code(t) if self.image_depth == 0 => self.text.push_str(t),
            Event::SoftBreak | Event::HardBreak if self.image_depth == 0 => self.text.push('\n'),
            _ => {}
        }
    }
}

/// Visible text of a document, without markup, image alt text, or raw HTML.
pub fn plain_text(md: &str) -> String {
    let mut collector = TextCollector::default();
    for event in Parser::new_ext(md, parser_options()) {
        collector.observe(&event);
    }
    collector.text
}

/// Page description: plain text without newlines or a leading `#`, cut to
/// [`DESCRIPTION_LIMIT`] characters.
pub fn description(md: &str) -> String {
    let text = plain_text(md).replace('\n', "");
    let text = text.strip_prefix('#').unwrap_or(&text);
    text.chars().take(DESCRIPTION_LIMIT).collect()
}

/// A heading listed in the in-page navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub level: usize,
    pub id: String,
    pub text: String,
}

/// Number of leading `#` when the line is a level 2 to 5 ATX heading.
fn header_level(line: &str) -> Option<usize> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    ((2..=5).contains(&hashes) && line[hashes..].starts_with(' ')).then_some(hashes)
}

/// Level 2 to 5 headings outside backtick fences, in document order.
///
/// Each line is parsed on its own as a heading, so the id matches the one
/// [`Renderer::render`] gives the same heading.
pub fn headers(md: &str) -> Vec<HeaderEntry> {
    let mut in_fence = false;
    md.lines()
        .filter_map(|line| {
            if line.starts_with("```") {
                in_fence = !in_fence;
                return None;
            }
            if in_fence {
                return None;
            }
            let level = header_level(line)?;
            let text = plain_text(line);
            Some(HeaderEntry {
                level,
                id: create_hash(&text),
                text,
            })
        })
        .collect()
}

/// The `__HEADER__` fragment: one `<p class="hN">` link per heading.
pub fn header_list(md: &str) -> String {
    let headers = headers(md);
    html! {
        nav.header-list {
            @for (i, header) in headers.iter().enumerate() {
                @if i > 0 { "\n" }
                p class={ "h" (header.level) } {
                    a href={ "#" (header.id) } { (header.text) }
                }
            }
        }
    }
    .into_string()
}
