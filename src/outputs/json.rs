//! The JSON article store.
//!
//! The store is a single JSON array of [`ArticleRecord`]s. It is loaded fully
//! into memory at startup, grown by appending, and rewritten in full after
//! every change. Rewrites go to a sibling `.tmp` file that is renamed over the
//! store, so an interrupted write leaves the previous version in place.
//!
//! ```text
//! backup.json
//! [{"url": "...", "title": "...", ..., "article_content": "..."}, ...]
//! ```

use crate::error::{Result, ScrapeError};
use crate::models::ArticleRecord;
use crate::utils::looks_truncated;
use itertools::Itertools;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
pub struct ArticleStore {
    path: PathBuf,
    records: Vec<ArticleRecord>,
    urls: HashSet<String>,
}

impl ArticleStore {
    /// Load the store at `path`, creating an empty file if none exists.
    ///
    /// An empty file loads as an empty store. Anything that does not parse
    /// as an array of records is refused rather than overwritten.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Store does not exist yet; creating it");
                fs::write(&path, b"").await.map_err(|e| ScrapeError::io(&path, e))?;
                Vec::new()
            }
            Err(e) => return Err(ScrapeError::io(&path, e)),
        };

        Self::from_raw(path, &raw)
    }

    /// Load an existing store without creating anything on disk.
    ///
    /// Used by stages that only read records.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Io`] if `path` cannot be read (including when it does not
    /// exist), [`ScrapeError::CorruptStore`] if it does not parse.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read(&path).await.map_err(|e| ScrapeError::io(&path, e))?;
        Self::from_raw(path, &raw)
    }

    fn from_raw(path: PathBuf, raw: &[u8]) -> Result<Self> {
        let records = parse_records(&path, raw)?;
        let store = Self::from_records(path, records);
        info!(records = store.len(), "Loaded article store");
        Ok(store)
    }

    fn from_records(path: PathBuf, records: Vec<ArticleRecord>) -> Self {
        let urls = records.iter().map(|r| r.url.clone()).collect();
        Self { path, records, urls }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Input URLs not yet in the store, deduplicated in first-seen order.
    pub fn pending<'a, I>(&self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        urls.into_iter()
            .unique()
            .filter(|url| !self.contains(url))
            .cloned()
            .collect()
    }

    /// Append a record. Returns `false` (and keeps the store unchanged) if a
    /// record with the same URL is already held.
    pub fn push(&mut self, record: ArticleRecord) -> bool {
        if !self.urls.insert(record.url.clone()) {
            warn!(url = %record.url, "Record already in store; not appending");
            return false;
        }
        self.records.push(record);
        true
    }

    /// Rewrite the whole store to disk.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), records = self.records.len()))]
    pub async fn save(&self) -> Result<()> {
        let json = serde_json::to_vec(&self.records)?;
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, &json)
            .await
            .map_err(|e| ScrapeError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ScrapeError::io(&self.path, e))?;
        debug!(bytes = json.len(), "Wrote article store");
        Ok(())
    }
}

fn parse_records(path: &Path, raw: &[u8]) -> Result<Vec<ArticleRecord>> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(raw).map_err(|e| {
        let reason = if looks_truncated(&e) {
            format!("truncated JSON ({e}); restore it from a backup")
        } else {
            e.to_string()
        };
        ScrapeError::CorruptStore {
            path: path.to_path_buf(),
            reason,
        }
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
