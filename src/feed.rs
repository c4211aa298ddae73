//! RSS 2.0 feed of the most recently dated pages.
//!
//! Only pages with a front-matter `date` take part. Dates use the fixed
//! `YYYY-MM-DD HH:MM` format and are read as UTC; they are displayed in the
//! configured IANA time zone as RFC 1123 (`Fri, 01 Mar 2024 21:00:00 JST`).
//! The feed keeps the [`MAX_FEED_ITEMS`] newest pages and is written to
//! `<output>/rss.xml`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rss::extension::atom::{AtomExtension, Link};
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use thiserror::Error;

use crate::collections::SortedLimited;
use crate::types::Page;

pub const FEED_FILE_NAME: &str = "rss.xml";
pub const MAX_FEED_ITEMS: usize = 20;
/// Front-matter date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
const RFC1123: &str = "%a, %d %b %Y %H:%M:%S %Z";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Unknown time zone: {0}")]
    TimeZone(String),
    #[error("Invalid date {date:?} in {url}: {source}")]
    InvalidDate {
        url: String,
        date: String,
        source: chrono::ParseError,
    },
    #[error("Failed to write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

pub struct FeedSettings<'a> {
    pub time_zone: &'a str,
    pub output_dir: &'a Path,
    pub base_url: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Debug)]
pub struct WrittenFeed {
    pub path: PathBuf,
    pub items: usize,
}

/// A dated page with its parsed publication time.
#[derive(Debug, Clone, Copy)]
pub struct FeedEntry<'p> {
    pub page: &'p Page,
    pub published: DateTime<Utc>,
}

fn newer(a: &FeedEntry<'_>, b: &FeedEntry<'_>) -> bool {
    a.published > b.published
}

pub fn parse_time_zone(name: &str) -> Result<Tz, FeedError> {
    name.parse::<Tz>()
        .map_err(|_| FeedError::TimeZone(name.to_string()))
}

pub fn parse_date(date: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(date, DATE_FORMAT).map(|dt| dt.and_utc())
}

fn rfc1123(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format(RFC1123).to_string()
}

/// Dated pages, newest first, capped at [`MAX_FEED_ITEMS`].
///
/// Every date is parsed up front, so one malformed date fails the feed
/// before anything is sorted.
pub fn recent_entries(pages: &[Page]) -> Result<Vec<FeedEntry<'_>>, FeedError> {
    let dated = pages
        .iter()
        .filter(|page| !page.meta.date.is_empty())
        .map(|page| {
            parse_date(&page.meta.date)
                .map(|published| FeedEntry { page, published })
                .map_err(|source| FeedError::InvalidDate {
                    url: page.url.clone(),
                    date: page.meta.date.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SortedLimited::from_items(dated, MAX_FEED_ITEMS, newer).into_vec())
}

fn render_channel(
    entries: &[FeedEntry<'_>],
    tz: Tz,
    settings: &FeedSettings<'_>,
    now: DateTime<Utc>,
) -> String {
    let items: Vec<Item> = entries
        .iter()
        .map(|entry| {
            let url = entry.page.url.clone();
            ItemBuilder::default()
                .title(entry.page.title.clone())
                .pub_date(rfc1123(entry.published, tz))
                .link(url.clone())
                .guid(GuidBuilder::default().permalink(true).value(url).build())
                .build()
        })
        .collect();

    let mut self_link = Link::default();
    self_link.set_href(format!("{}/{FEED_FILE_NAME}", settings.base_url));
    self_link.set_rel("self");
    self_link.set_mime_type(Some("application/rss+xml".to_string()));
    let mut atom = AtomExtension::default();
    atom.set_links(vec![self_link]);

    let built = rfc1123(now, tz);
    let channel = ChannelBuilder::default()
        .title(settings.title)
        .link(settings.base_url)
        .description(settings.description)
        .pub_date(built.clone())
        .last_build_date(built)
        .atom_ext(atom)
        .items(items)
        .build();
    channel.to_string().trim().to_string()
}

/// Render the feed XML as of `now`.
pub fn build_feed(
    pages: &[Page],
    settings: &FeedSettings<'_>,
    now: DateTime<Utc>,
) -> Result<String, FeedError> {
    let tz = parse_time_zone(settings.time_zone)?;
    let entries = recent_entries(pages)?;
    Ok(render_channel(&entries, tz, settings, now))
}

/// Render the feed as of the current time and write it to the output root.
pub fn write_feed(pages: &[Page], settings: &FeedSettings<'_>) -> Result<WrittenFeed, FeedError> {
    let tz = parse_time_zone(settings.time_zone)?;
    let entries = recent_entries(pages)?;
    let xml = render_channel(&entries, tz, settings, Utc::now());
    let path = settings.output_dir.join(FEED_FILE_NAME);
    fs::write(&path, xml).map_err(|source| FeedError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(WrittenFeed {
        path,
        items: entries.len(),
    })
}
