//! Archived listing page indexer.
//!
//! Pages through `{archive}/web/{timestamp}/{site}?page=N` for an inclusive
//! page range. Each page's content block is located by element id, its list
//! items by class, and the first anchor of each item gives an article URL.
//! Hrefs are resolved against the listing URL, so Wayback's `/web/...`
//! relative links come out absolute.
//!
//! A page that fails (request, status, missing block, file write) is logged
//! and skipped; the run always walks the full range.

use crate::client::PageFetcher;
use crate::config::Settings;
use crate::error::{Result, ScrapeError};
use crate::models::ListingReport;
use crate::outputs::url_files::write_page_urls;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Selectors for the listing's content block and its items.
#[derive(Debug)]
pub struct ListingSelectors {
    block: Selector,
    item: Selector,
}

impl ListingSelectors {
    pub fn new(block_id: &str, item_class: &str) -> Result<Self> {
        let parse = |css: String| {
            Selector::parse(&css)
                .map_err(|e| ScrapeError::Config(format!("bad selector {css:?}: {e}")))
        };
        Ok(Self {
            block: parse(format!("#{block_id}"))?,
            item: parse(format!(".{item_class}"))?,
        })
    }
}

/// Extract article URLs from one listing page, in document order.
///
/// Items without an anchor, or whose first anchor has no `href`, are skipped.
/// An `href` that cannot be resolved against `page_url` is logged and skipped;
/// the rest of the page is kept.
///
/// # Errors
///
/// [`ScrapeError::MissingElement`] if the content block is absent.
pub fn extract_listing_urls(
    html: &str,
    page_url: &Url,
    selectors: &ListingSelectors,
) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let block = document
        .select(&selectors.block)
        .next()
        .ok_or_else(|| ScrapeError::missing("listing content block"))?;

    let mut urls = Vec::new();
    for item in block.select(&selectors.item) {
        let Some(href) = item
            .select(&ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        match page_url.join(href) {
            Ok(resolved) => urls.push(resolved.to_string()),
            Err(e) => warn!(href, error = %e, "Unresolvable listing href; skipping item"),
        }
    }
    Ok(urls)
}

/// Fetch one listing page and return its article URLs.
#[instrument(level = "info", skip(fetcher, selectors))]
pub async fn index_page<F: PageFetcher>(
    fetcher: &F,
    page_url: &str,
    selectors: &ListingSelectors,
) -> Result<Vec<String>> {
    let base = Url::parse(page_url).map_err(|source| ScrapeError::InvalidUrl {
        href: page_url.to_string(),
        source,
    })?;
    let html = fetcher.get_text(page_url).await?;
    let urls = extract_listing_urls(&html, &base, selectors)?;
    debug!(urls = ?urls, "Listing URLs");
    Ok(urls)
}

/// Walk the configured page range, writing one URL file per page.
///
/// Pages that fail are logged and counted, and the walk continues. After the
/// last page the configured end-of-run pause is observed.
///
/// # Errors
///
/// Only [`ScrapeError::Config`] for unusable block or item selectors; page
/// failures end up in the returned [`ListingReport`].
#[instrument(level = "info", skip_all, fields(
    start = settings.listing.start_page,
    end = settings.listing.end_page,
    timestamp = %settings.snapshot_timestamp,
))]
pub async fn index_pages<F: PageFetcher>(fetcher: &F, settings: &Settings) -> Result<ListingReport> {
    let listing = &settings.listing;
    let selectors = ListingSelectors::new(&listing.content_block_id, &listing.item_class)?;
    let mut report = ListingReport::default();

    for page in listing.start_page..=listing.end_page {
        let page_url = settings.listing_page_url(page);
        report.pages_requested += 1;

        let outcome = async {
            let urls = index_page(fetcher, &page_url, &selectors).await?;
            let path = write_page_urls(&listing.output_dir, page, &urls).await?;
            Ok::<_, ScrapeError>((urls.len(), path))
        }
        .await;

        match outcome {
            Ok((count, path)) => {
                report.pages_written += 1;
                report.urls_collected += count;
                info!(page, count, path = %path.display(), "Indexed listing page");
            }
            Err(e) => {
                report.pages_failed += 1;
                error!(page, url = %page_url, error = %e, "Listing page failed; continuing");
            }
        }
    }

    let delay = Duration::from_secs(listing.end_of_run_delay_secs);
    if !delay.is_zero() {
        debug!(?delay, "End-of-run pause");
        sleep(delay).await;
    }

    info!(
        requested = report.pages_requested,
        written = report.pages_written,
        failed = report.pages_failed,
        urls = report.urls_collected,
        "Listing pagination complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeFetcher;
    use std::path::Path;

    fn selectors() -> ListingSelectors {
        ListingSelectors::new("block-lenin-content", "views-row").unwrap()
    }

    fn listing_html(hrefs: &[&str]) -> String {
        let items: String = hrefs
            .iter()
            .map(|h| format!(r#"<div class="views-row"><h3><a href="{h}">Story</a></h3><a href="/other">more</a></div>"#))
            .collect();
        format!(
            r#"<html><body><div id="sidebar"><div class="views-row"><a href="/nav">nav</a></div></div>
            <div id="block-lenin-content">{items}</div></body></html>"#
        )
    }

    fn settings(dir: &Path, start: u32, end: u32) -> Settings {
        let mut settings = Settings::default();
        settings.listing.start_page = start;
        settings.listing.end_page = end;
        settings.listing.output_dir = dir.to_path_buf();
        settings.listing.end_of_run_delay_secs = 0;
        settings
    }

    #[test]
    fn test_extract_returns_hrefs_in_order() {
        let base = Url::parse("https://web.archive.org/web/20230331041108/http://bodhicommons.org?page=3").unwrap();
        let html = listing_html(&[
            "/web/20230331041108/http://bodhicommons.org/first",
            "https://web.archive.org/web/20230331041108/http://bodhicommons.org/second",
            "/web/20230331041108/http://bodhicommons.org/third",
        ]);

        let urls = extract_listing_urls(&html, &base, &selectors()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://web.archive.org/web/20230331041108/http://bodhicommons.org/first",
                "https://web.archive.org/web/20230331041108/http://bodhicommons.org/second",
                "https://web.archive.org/web/20230331041108/http://bodhicommons.org/third",
            ]
        );
    }

    #[test]
    fn test_items_without_anchor_are_skipped() {
        let base = Url::parse("https://web.archive.org/").unwrap();
        let html = r#"<div id="block-lenin-content">
            <div class="views-row"><a href="/a">A</a></div>
            <div class="views-row"><span>no link</span></div>
            <div class="views-row"><a name="anchor-only">B</a></div>
        </div>"#;
        let urls = extract_listing_urls(html, &base, &selectors()).unwrap();
        assert_eq!(urls, vec!["https://web.archive.org/a"]);
    }

    #[test]
    fn test_unresolvable_href_keeps_rest_of_page() {
        let base = Url::parse("https://web.archive.org/web/20230331041108/http://bodhicommons.org?page=3").unwrap();
        let html = listing_html(&["/good-1", "http://[broken", "/good-2"]);
        let urls = extract_listing_urls(&html, &base, &selectors()).unwrap();
        assert_eq!(
            urls,
            vec!["https://web.archive.org/good-1", "https://web.archive.org/good-2"]
        );
    }

    #[test]
    fn test_missing_block_is_error() {
        let base = Url::parse("https://web.archive.org/").unwrap();
        let err = extract_listing_urls("<html><body></body></html>", &base, &selectors()).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingElement { .. }));
    }

    #[tokio::test]
    async fn test_index_pages_requests_every_page_and_survives_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path(), 3, 6);
        let fetcher = FakeFetcher::new()
            .with_page(settings.listing_page_url(3), listing_html(&["/p3a", "/p3b"]))
            .with_failure(settings.listing_page_url(4))
            .with_page(settings.listing_page_url(5), "<html><body>blocked</body></html>")
            .with_page(settings.listing_page_url(6), listing_html(&["/p6a"]));

        let report = index_pages(&fetcher, &settings).await.unwrap();

        let expected: Vec<String> = (3..=6).map(|p| settings.listing_page_url(p)).collect();
        assert_eq!(fetcher.requested(), expected);
        assert_eq!(
            report,
            ListingReport {
                pages_requested: 4,
                pages_written: 2,
                pages_failed: 2,
                urls_collected: 3,
            }
        );

        let page6 = std::fs::read_to_string(tmp.path().join("page_6_urls.txt")).unwrap();
        assert_eq!(page6, "https://web.archive.org/p6a\n");
        assert!(!tmp.path().join("page_4_urls.txt").exists());
        assert!(!tmp.path().join("page_5_urls.txt").exists());
    }

    #[tokio::test]
    async fn test_page_with_bad_href_is_still_written() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path(), 8, 8);
        let fetcher = FakeFetcher::new().with_page(
            settings.listing_page_url(8),
            listing_html(&["/a", "http://[broken", "/b"]),
        );

        let report = index_pages(&fetcher, &settings).await.unwrap();

        assert_eq!(report.pages_written, 1);
        assert_eq!(report.pages_failed, 0);
        let page8 = std::fs::read_to_string(tmp.path().join("page_8_urls.txt")).unwrap();
        assert_eq!(page8, "https://web.archive.org/a\nhttps://web.archive.org/b\n");
    }

    #[tokio::test]
    async fn test_page_files_hold_only_their_own_urls() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path(), 1, 2);
        let fetcher = FakeFetcher::new()
            .with_page(settings.listing_page_url(1), listing_html(&["/one"]))
            .with_page(settings.listing_page_url(2), listing_html(&["/two"]));

        index_pages(&fetcher, &settings).await.unwrap();

        let page2 = std::fs::read_to_string(tmp.path().join("page_2_urls.txt")).unwrap();
        assert_eq!(page2, "https://web.archive.org/two\n");
    }
}
