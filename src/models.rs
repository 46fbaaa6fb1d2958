//! Data models for scraped articles and stage reports.
//!
//! - [`ArticleRecord`]: one extracted article, as stored in the JSON store
//! - [`ListingReport`], [`FetchReport`], [`ImageReport`]: per-run counters
//!   logged at the end of each stage

use serde::{Deserialize, Serialize};

/// A single article extracted from an archived page.
///
/// The field order here is the key order written to the store. Every field
/// except `url` defaults to empty on load, so records written by older runs
/// with fewer keys still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The URL the article was fetched from; primary identifier in the store.
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub authors: String,
    /// ISO 639-3 code guessed from the title, or empty.
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image `src` values as they appear in the page (often archive-relative).
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub article_content: String,
}

/// Outcome of a listing pagination run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListingReport {
    pub pages_requested: usize,
    pub pages_written: usize,
    pub pages_failed: usize,
    pub urls_collected: usize,
}

/// Outcome of an article fetch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// URLs left after removing those already in the store.
    pub pending: usize,
    pub scraped: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Outcome of an image download run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageReport {
    pub requested: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}
