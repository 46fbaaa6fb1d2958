//! Extractor for `beta.` host article pages.
//!
//! Everything lives inside the first `span.field-content`. Byline, date and
//! tags sit in table cells of that span, and the article prose is whatever
//! text remains once the tables are left out.

use super::{clean_author, element_text, image_sources, page_title, stripped_text, text_without_tables};
use crate::error::{Result, ScrapeError};
use crate::models::ArticleRecord;
use crate::utils::{detect_language, normalize_text};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static FIELD_CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse("span.field-content").unwrap());
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

pub fn extract(document: &Html, url: &str) -> Result<ArticleRecord> {
    let title = page_title(document)?;
    let content = document
        .select(&FIELD_CONTENT)
        .next()
        .ok_or_else(|| ScrapeError::missing("field content"))?;
    let cells: Vec<ElementRef<'_>> = content.select(&TD).collect();
    let tags = tags(&cells);

    Ok(ArticleRecord {
        url: url.to_string(),
        language: detect_language(&title),
        title,
        published_date: published_date(&cells)?,
        authors: authors(&cells),
        categories: tags.clone(),
        tags,
        images: image_sources(content),
        article_content: normalize_text(&text_without_tables(content)),
    })
}

/// First cell, when the byline table is present.
fn authors(cells: &[ElementRef<'_>]) -> String {
    if cells.len() > 1 {
        clean_author(&stripped_text(cells[0]))
    } else {
        String::new()
    }
}

/// Second cell; pages without it are not articles.
fn published_date(cells: &[ElementRef<'_>]) -> Result<String> {
    if cells.len() > 2 {
        Ok(element_text(cells[1]).trim().to_string())
    } else {
        Err(ScrapeError::missing("published date"))
    }
}

/// Link texts of the third-from-last cell.
fn tags(cells: &[ElementRef<'_>]) -> Vec<String> {
    if cells.len() <= 3 {
        return Vec::new();
    }
    cells[cells.len() - 3]
        .select(&ANCHOR)
        .map(|a| element_text(a).trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://web.archive.org/web/20230331041108/http://beta.bodhicommons.org/article/42";

    const ARTICLE: &str = r#"<html><head><title>Example Title</title></head>
<body>
<span class="field-content">
  <table>
    <tr><td>- John Mathew</td><td>05 June 2014</td></tr>
    <tr><td><a href="/tag/faith">Faith</a> <a href="/tag/politics">Politics</a></td><td>share</td><td>print</td></tr>
  </table>
  <p>Opening paragraph.</p>
  <img src="/web/20230331041108im_/http://beta.bodhicommons.org/files/pic.jpg">
  <p>Closing paragraph.</p>
</span>
</body></html>"#;

    #[test]
    fn test_extract_full_article() {
        let record = extract(&Html::parse_document(ARTICLE), URL).unwrap();
        assert_eq!(record.title, "Example Title");
        assert_eq!(record.authors, "John Mathew");
        assert_eq!(record.published_date, "05 June 2014");
        assert_eq!(record.tags, vec!["Faith", "Politics"]);
        assert_eq!(record.categories, record.tags);
        assert_eq!(
            record.images,
            vec!["/web/20230331041108im_/http://beta.bodhicommons.org/files/pic.jpg"]
        );
        assert_eq!(
            record.article_content,
            "Opening paragraph.\n\nClosing paragraph."
        );
    }

    #[test]
    fn test_body_excludes_table_cells() {
        let record = extract(&Html::parse_document(ARTICLE), URL).unwrap();
        assert!(!record.article_content.contains("John Mathew"));
        assert!(!record.article_content.contains("05 June 2014"));
        assert!(!record.article_content.contains("Faith"));
    }

    #[test]
    fn test_missing_content_region_fails() {
        let html = "<html><head><title>Example Title</title></head><body><p>gone</p></body></html>";
        let err = extract(&Html::parse_document(html), URL).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingElement {
                field: "field content"
            }
        ));
    }

    #[test]
    fn test_missing_date_cell_fails() {
        let html = r#"<html><head><title>T</title></head><body>
            <span class="field-content"><table><tr><td>- A</td><td>B</td></tr></table>text</span>
            </body></html>"#;
        let err = extract(&Html::parse_document(html), URL).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingElement {
                field: "published date"
            }
        ));
    }
}
