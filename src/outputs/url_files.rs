//! Plain-text URL list files.
//!
//! `collect` writes one file per listing page; `fetch` reads back every file in
//! the directory whose name passes the layout's [`UrlFileFilter`].
//!
//! ```text
//! urls/
//! ├── page_19_urls.txt
//! ├── page_20_urls.txt
//! └── beta_page_3_urls.txt
//! ```

use crate::error::{Result, ScrapeError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Filename substring rules selecting which URL files feed a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlFileFilter {
    pub include: Option<&'static str>,
    pub exclude: Option<&'static str>,
}

impl UrlFileFilter {
    pub fn matches(&self, file_name: &str) -> bool {
        self.include.is_none_or(|s| file_name.contains(s))
            && !self.exclude.is_some_and(|s| file_name.contains(s))
    }
}

/// `page_{N}_urls.txt`, the file one listing page's URLs are written to.
pub fn page_file_name(page: u32) -> String {
    format!("page_{page}_urls.txt")
}

/// Write one listing page's URLs, one per line, replacing any earlier file.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "debug", skip(urls), fields(count = urls.len()))]
pub async fn write_page_urls(dir: &Path, page: u32, urls: &[String]) -> Result<PathBuf> {
    let path = dir.join(page_file_name(page));
    let mut body = String::with_capacity(urls.iter().map(|u| u.len() + 1).sum());
    for url in urls {
        body.push_str(url);
        body.push('\n');
    }
    fs::write(&path, body)
        .await
        .map_err(|e| ScrapeError::io(&path, e))?;
    Ok(path)
}

/// Read every URL from the matching files in `dir`.
///
/// Files are visited in name order; blank lines are skipped.
///
/// # Arguments
///
/// * `dir` - Directory written by the `collect` stage
/// * `filter` - File name rules, usually [`Layout::url_file_filter`]
///
/// # Errors
///
/// [`ScrapeError::Io`] if the directory or any matching file cannot be read.
///
/// [`Layout::url_file_filter`]: crate::scrapers::Layout::url_file_filter
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn read_url_files(dir: &Path, filter: UrlFileFilter) -> Result<Vec<String>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ScrapeError::io(dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ScrapeError::io(dir, e))?
    {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map_err(|e| ScrapeError::io(&path, e))?
            .is_file();
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_file && filter.matches(&name) {
            files.push(path);
        }
    }
    files.sort();

    let mut urls = Vec::new();
    for path in &files {
        let text = fs::read_to_string(path)
            .await
            .map_err(|e| ScrapeError::io(path, e))?;
        let before = urls.len();
        urls.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
        debug!(file = %path.display(), urls = urls.len() - before, "Read URL file");
    }

    info!(files = files.len(), urls = urls.len(), "Loaded article URLs");
    Ok(urls)
}
