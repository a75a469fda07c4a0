// src/feed/mod.rs
pub mod http;
pub mod parse;

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, FeedError};

const YOUTUBE_FEED_PREFIX: &str = "https://www.youtube.com/feeds/";

/// Item category. Drives the recency window, the dedup key and whether the
/// keyword router is consulted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Blog posts / writeups. Same-day window, keyword-routed.
    Article,
    /// Video uploads. Two-day window, fixed destination.
    Video,
}

/// A discovered feed entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    /// Stable external reference, usually the article/video URL.
    pub identifier: String,
    pub title: String,
    /// Publication timestamp exactly as the feed printed it.
    pub published: String,
    pub kind: SourceKind,
}

/// One configured feed location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub url: String,
    pub kind: SourceKind,
}

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = if url.starts_with(YOUTUBE_FEED_PREFIX) {
            SourceKind::Video
        } else {
            SourceKind::Article
        };
        Self { url, kind }
    }
}

/// Supplies the items of one feed. Must fail as a whole instead of handing
/// back a half-parsed list.
#[async_trait::async_trait]
pub trait FeedReader: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<Item>, FeedError>;
}

/// Read the feed list: one URL per line, blanks and `#` comments skipped,
/// order preserved.
pub fn load_feed_list(path: &Path) -> Result<Vec<FeedSource>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::FeedList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_feed_list(&content))
}

pub fn parse_feed_list(content: &str) -> Vec<FeedSource> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(FeedSource::new)
        .collect()
}
