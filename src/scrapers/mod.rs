//! Page scrapers for archived listing and article pages.
//!
//! Scraping happens in two phases:
//!
//! 1. **Indexing** ([`listing`]): paginate the archived listing and harvest
//!    article URLs into per-page text files
//! 2. **Extraction**: parse each article page into an [`ArticleRecord`]
//!
//! The site was captured under two page designs, so extraction is selected by
//! [`Layout`]:
//!
//! | Layout | Module | Content region | Default store |
//! |--------|--------|----------------|---------------|
//! | `standard` | [`standard`] | whole document, Drupal field classes | `backup.json` |
//! | `beta` | [`beta`] | `span.field-content`, table cells | `backup_beta.json` |
//!
//! Extractors are pure functions over a parsed [`Html`] document; they never
//! mutate it, so field order does not matter.

pub mod beta;
pub mod listing;
pub mod standard;

use crate::client::PageFetcher;
use crate::error::{Result, ScrapeError};
use crate::models::ArticleRecord;
use crate::outputs::url_files::UrlFileFilter;
use clap::ValueEnum;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, instrument};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Which page design to extract article fields from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Main site pages with Drupal field classes.
    #[default]
    Standard,
    /// Pages from the `beta.` host, fields laid out in table cells.
    Beta,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layout::Standard => "standard",
            Layout::Beta => "beta",
        })
    }
}

impl Layout {
    /// Store file used when no `--store` is given.
    pub fn default_store_name(self) -> &'static str {
        match self {
            Layout::Standard => "backup.json",
            Layout::Beta => "backup_beta.json",
        }
    }

    /// Beta-host URLs are left to the beta layout.
    pub fn default_skip_substring(self) -> Option<&'static str> {
        match self {
            Layout::Standard => Some("beta.bodhicommons.org"),
            Layout::Beta => None,
        }
    }

    /// Which URL list files in the URL directory feed this layout.
    pub fn url_file_filter(self) -> UrlFileFilter {
        match self {
            Layout::Standard => UrlFileFilter {
                include: Some("_urls.txt"),
                exclude: Some("beta"),
            },
            Layout::Beta => UrlFileFilter {
                include: Some("beta"),
                exclude: None,
            },
        }
    }

    /// Parse `html` and extract an article record for `url`.
    pub fn extract(self, html: &str, url: &str) -> Result<ArticleRecord> {
        let document = Html::parse_document(html);
        match self {
            Layout::Standard => standard::extract(&document, url),
            Layout::Beta => beta::extract(&document, url),
        }
    }
}

/// Fetch one article page and extract its record.
#[instrument(level = "info", skip(fetcher, layout), fields(%layout))]
pub async fn fetch_article<F: PageFetcher>(
    fetcher: &F,
    layout: Layout,
    url: &str,
) -> Result<ArticleRecord> {
    let body = fetcher.get_text(url).await?;
    debug!(bytes = body.len(), "Fetched article page");
    let record = layout.extract(&body, url)?;
    info!(
        title = %record.title,
        language = %record.language,
        tags = record.tags.len(),
        images = record.images.len(),
        content_bytes = record.article_content.len(),
        "Parsed article"
    );
    Ok(record)
}

/// Trimmed text of the document's `<title>`; missing title is an error.
pub fn page_title(document: &Html) -> Result<String> {
    document
        .select(&TITLE)
        .next()
        .map(|title| element_text(title).trim().to_string())
        .ok_or_else(|| ScrapeError::missing("title"))
}

/// Concatenated text of every descendant text node.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Text pieces trimmed and joined with single spaces, empty pieces dropped.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Author bylines are rendered as `- Name`; drop the dash.
pub fn clean_author(raw: &str) -> String {
    raw.trim().trim_start_matches('-').trim_start().to_string()
}

/// `src` of every `<img>` below `root`, in document order.
pub fn image_sources(root: ElementRef<'_>) -> Vec<String> {
    root.select(&IMG)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect()
}

/// Text below `root` with every `<table>` subtree left out.
///
/// Tables in the beta layout hold the byline, date and tag cells rather than
/// article prose.
pub fn text_without_tables(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text_skipping_tables(root, &mut out);
    out
}

fn push_text_skipping_tables(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if child_element.value().name() != "table" {
                push_text_skipping_tables(child_element, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeFetcher;

    #[test]
    fn test_page_title_trimmed() {
        let doc = Html::parse_document(
            "<html><head><title>\n  Example Title  \n</title></head><body></body></html>",
        );
        assert_eq!(page_title(&doc).unwrap(), "Example Title");
    }

    #[test]
    fn test_page_title_missing_is_error() {
        let doc = Html::parse_document("<html><body><h1>No title here</h1></body></html>");
        assert!(matches!(
            page_title(&doc),
            Err(ScrapeError::MissingElement { field: "title" })
        ));
    }

    #[test]
    fn test_text_without_tables() {
        let doc = Html::parse_fragment(
            "<span id=\"root\">Intro <table><tr><td>- Author</td></tr></table>\
             <p>Body <b>bold</b></p><table><tr><td>Tags</td></tr></table>Outro</span>",
        );
        let root = doc
            .select(&Selector::parse("#root").unwrap())
            .next()
            .unwrap();
        assert_eq!(text_without_tables(root), "Intro Body boldOutro");
        // the parsed tree is left intact
        assert_eq!(doc.select(&Selector::parse("td").unwrap()).count(), 2);
    }

    #[test]
    fn test_image_sources_skip_missing_src() {
        let doc = Html::parse_fragment(
            "<div><img src=\"/a.jpg\"><img alt=\"x\"><img src=\"/b.png\"></div>",
        );
        assert_eq!(image_sources(doc.root_element()), vec!["/a.jpg", "/b.png"]);
    }

    #[test]
    fn test_clean_author() {
        assert_eq!(clean_author("  - Jane Doe "), "Jane Doe");
        assert_eq!(clean_author("Jane Doe"), "Jane Doe");
        assert_eq!(clean_author(""), "");
    }

    #[test]
    fn test_layout_file_filters() {
        let standard = Layout::Standard.url_file_filter();
        assert!(standard.matches("page_3_urls.txt"));
        assert!(!standard.matches("page_3_beta_urls.txt"));

        let beta = Layout::Beta.url_file_filter();
        assert!(beta.matches("beta_links.txt"));
        assert!(!beta.matches("page_3_urls.txt"));
    }

    #[tokio::test]
    async fn test_fetch_article_propagates_fetch_error() {
        let fetcher = FakeFetcher::new();
        let err = fetch_article(&fetcher, Layout::Standard, "https://example.com/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
    }
}
