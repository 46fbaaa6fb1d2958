//! Local copies of article images.
//!
//! Image sources in archived pages are usually archive-relative
//! (`/web/20230127184806im_/http://site/files/x.jpg`), so they are resolved
//! against the article URL before download. Files are named after the last
//! path segment and never overwritten.

use crate::error::{Result, ScrapeError};
use std::path::{Path, PathBuf};
use tokio::fs;
use url::Url;

/// Resolve an `<img src>` against the page it came from.
///
/// Only `http`/`https` results are accepted; `data:` URIs and the like are
/// rejected.
pub fn resolve_image_url(article_url: &str, src: &str) -> Result<Url> {
    let invalid = |source| ScrapeError::InvalidUrl {
        href: src.to_string(),
        source,
    };
    let base = Url::parse(article_url).map_err(invalid)?;
    let url = base.join(src).map_err(invalid)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ScrapeError::UnsupportedScheme(url.to_string())),
    }
}

/// Last non-empty path segment, which names the local file.
pub fn image_file_name(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Write downloaded image bytes to `dir/file_name`, replacing any earlier file.
///
/// # Arguments
///
/// * `dir` - Image output directory, which must already exist
/// * `file_name` - Local name, usually from [`image_file_name`]
/// * `bytes` - Response body as received
///
/// # Returns
///
/// The path written, or [`ScrapeError::Io`] if the write fails.
pub async fn write_image(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    fs::write(&path, bytes)
        .await
        .map_err(|e| ScrapeError::io(&path, e))?;
    Ok(path)
}
