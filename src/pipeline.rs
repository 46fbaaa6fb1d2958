//! Sequential fetch loops over the article store.
//!
//! [`FetchContext`] owns everything a run mutates or paces on: the fetcher,
//! the loaded store and the delays. The loops never hold state anywhere else,
//! so a run is fully described by the context passed in.
//!
//! Per-item failures are logged and counted, and the store is flushed to disk
//! after every item whether it succeeded or not. A URL that failed is not
//! remembered, so the next run attempts it again.

use crate::client::PageFetcher;
use crate::config::Pacing;
use crate::error::Result;
use crate::models::{FetchReport, ImageReport};
use crate::outputs::images::{image_file_name, resolve_image_url, write_image};
use crate::outputs::json::ArticleStore;
use crate::scrapers::{Layout, fetch_article};
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

/// Per-run state for the article fetch loop.
#[derive(Debug)]
pub struct FetchContext<F> {
    pub fetcher: F,
    pub layout: Layout,
    pub store: ArticleStore,
    pub pacing: Pacing,
    /// URLs containing this are skipped without a request.
    pub skip_substring: Option<String>,
}

impl<F: PageFetcher> FetchContext<F> {
    fn should_skip(&self, url: &str) -> bool {
        self.skip_substring
            .as_deref()
            .is_some_and(|needle| url.contains(needle))
    }

    async fn flush(&self) {
        if let Err(e) = self.store.save().await {
            error!(path = %self.store.path().display(), error = %e, "Failed to write store");
        }
    }

    /// Scrape every URL in `urls` that the store does not hold yet.
    ///
    /// Each URL is fetched and extracted with the context's layout. Records are
    /// appended and the store is rewritten after every URL, success or not, so
    /// an interrupted run resumes where it stopped. Per-URL failures are logged
    /// and counted.
    ///
    /// # Returns
    ///
    /// A [`FetchReport`] with pending, scraped, failed and skipped counts, or
    /// an error if the final store write fails.
    #[instrument(level = "info", skip_all, fields(layout = %self.layout, store = %self.store.path().display()))]
    pub async fn fetch_articles(&mut self, urls: &[String]) -> Result<FetchReport> {
        let pending = self.store.pending(urls);
        let total = pending.len();
        let mut report = FetchReport {
            pending: total,
            ..Default::default()
        };
        info!(
            input = urls.len(),
            already_stored = self.store.len(),
            pending = total,
            "Starting article fetch"
        );

        for (i, url) in pending.iter().enumerate() {
            let index = i + 1;
            if self.should_skip(url) {
                report.skipped += 1;
                info!(%url, "Skipping URL for another layout");
                continue;
            }

            match fetch_article(&self.fetcher, self.layout, url).await {
                Ok(record) => {
                    debug!(%url, body = %truncate_for_log(&record.article_content, 120), "Extracted record");
                    if self.store.push(record) {
                        report.scraped += 1;
                    }
                    self.flush().await;
                    info!(index, total, "Finished writing {index} articles out of {total} articles");
                }
                Err(e) => {
                    report.failed += 1;
                    self.flush().await;
                    error!(index, %url, error = %e, "Article failed; it will be retried on the next run");
                }
            }

            self.pacing.after_request(index).await;
        }

        self.store.save().await?;
        info!(
            pending = report.pending,
            scraped = report.scraped,
            failed = report.failed,
            skipped = report.skipped,
            stored = self.store.len(),
            "Article fetch complete"
        );
        Ok(report)
    }
}

enum ImageOutcome {
    Downloaded,
    Skipped,
    Failed,
}

/// Download every distinct image referenced by the store into `dir`.
///
/// Images whose file already exists are skipped.
///
/// # Arguments
///
/// * `fetcher` - Client used for the image requests
/// * `store` - Loaded store; only read
/// * `dir` - Existing, writable output directory
///
/// # Returns
///
/// An [`ImageReport`]; download failures are counted, not returned.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn download_images<F: PageFetcher>(
    fetcher: &F,
    store: &ArticleStore,
    dir: &Path,
) -> ImageReport {
    let sources: Vec<(&str, &str)> = store
        .records()
        .iter()
        .flat_map(|record| {
            record
                .images
                .iter()
                .map(move |src| (record.url.as_str(), src.as_str()))
        })
        .unique_by(|(_, src)| *src)
        .collect();
    info!(count = sources.len(), "Collected image sources");

    let outcomes: Vec<ImageOutcome> = stream::iter(sources.iter())
        .then(|(article_url, src)| async move {
            let url = match resolve_image_url(article_url, src) {
                Ok(url) => url,
                Err(e) => {
                    warn!(%src, error = %e, "Cannot resolve image");
                    return ImageOutcome::Failed;
                }
            };
            let Some(name) = image_file_name(&url) else {
                warn!(%url, "Image URL has no file name; skipping");
                return ImageOutcome::Skipped;
            };
            if dir.join(&name).exists() {
                debug!(%name, "Image already downloaded");
                return ImageOutcome::Skipped;
            }
            let saved = async {
                let bytes = fetcher.get_bytes(url.as_str()).await?;
                write_image(dir, &name, &bytes).await
            }
            .await;
            match saved {
                Ok(path) => {
                    info!(%url, path = %path.display(), "Saved image");
                    ImageOutcome::Downloaded
                }
                Err(e) => {
                    error!(%url, error = %e, "Image download failed");
                    ImageOutcome::Failed
                }
            }
        })
        .collect()
        .await;

    let mut report = ImageReport {
        requested: sources.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            ImageOutcome::Downloaded => report.downloaded += 1,
            ImageOutcome::Skipped => report.skipped += 1,
            ImageOutcome::Failed => report.failed += 1,
        }
    }
    info!(
        requested = report.requested,
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed,
        "Image download complete"
    );
    report
}
