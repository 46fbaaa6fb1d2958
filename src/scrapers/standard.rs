//! Extractor for main-site article pages.
//!
//! Fields are read from the whole document using the Drupal field classes the
//! site rendered. Only the title and the body are required.

use super::{clean_author, element_text, image_sources, page_title, stripped_text};
use crate::error::{Result, ScrapeError};
use crate::models::ArticleRecord;
use crate::utils::{detect_language, normalize_text};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("span.author-name").unwrap());
static AUTHORED_AT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.authored-at.is-pulled-right").unwrap());
static TAGS: Lazy<Selector> = Lazy::new(|| Selector::parse("div.field--name-field-tags").unwrap());
static BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.text-formatted.field--name-body").unwrap());

pub fn extract(document: &Html, url: &str) -> Result<ArticleRecord> {
    let title = page_title(document)?;
    let article_content = article_body(document)?;

    Ok(ArticleRecord {
        url: url.to_string(),
        language: detect_language(&title),
        title,
        published_date: published_date(document),
        authors: authors(document),
        tags: tags(document),
        images: image_sources(document.root_element()),
        categories: Vec::new(),
        article_content,
    })
}

fn authors(document: &Html) -> String {
    document
        .select(&AUTHOR)
        .next()
        .map(|span| clean_author(&stripped_text(span)))
        .unwrap_or_default()
}

fn published_date(document: &Html) -> String {
    document
        .select(&AUTHORED_AT)
        .next()
        .map(|span| element_text(span).trim().to_string())
        .unwrap_or_default()
}

/// Tag words from the tag field, without its `Tags` label.
fn tags(document: &Html) -> Vec<String> {
    let Some(field) = document.select(&TAGS).next() else {
        return Vec::new();
    };
    element_text(field)
        .split_whitespace()
        .filter(|word| *word != "Tags")
        .map(str::to_string)
        .collect()
}

fn article_body(document: &Html) -> Result<String> {
    document
        .select(&BODY)
        .next()
        .map(|body| normalize_text(&element_text(body)))
        .ok_or_else(|| ScrapeError::missing("article body"))
}
