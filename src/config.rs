//! Run configuration.
//!
//! [`Settings`] carries every knob the three stages read. Built-in defaults
//! target the Bodhi Commons capture the scraper was written for; a YAML file
//! passed with `--config` replaces any subset of them, and command-line flags
//! (or their environment variables) win over both. See [`crate::cli::Cli::apply`].
//!
//! ```yaml
//! site_url: http://bodhicommons.org
//! snapshot_timestamp: "20230331041108"
//! listing:
//!   start_page: 0
//!   end_page: 65
//! fetch:
//!   layout: beta
//!   request_delay_secs: 5
//! ```

use crate::error::{Result, ScrapeError};
use crate::scrapers::Layout;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument};
use url::Url;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:130.0) Gecko/20100101 Firefox/130.0";

/// Format of a Wayback snapshot timestamp.
const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Site whose archived listing pages are paginated.
    pub site_url: String,
    /// Snapshot to read listing pages from (`YYYYMMDDhhmmss`).
    pub snapshot_timestamp: String,
    /// Root of the snapshot service.
    pub archive_base: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub listing: ListingSettings,
    pub fetch: FetchSettings,
    pub images: ImageSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingSettings {
    pub start_page: u32,
    /// Inclusive.
    pub end_page: u32,
    pub output_dir: PathBuf,
    /// Element id of the block holding the article list.
    pub content_block_id: String,
    /// Class carried by each list item inside the block.
    pub item_class: String,
    pub end_of_run_delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
    pub layout: Layout,
    /// Directory holding the `*_urls.txt` files written by `collect`.
    pub url_dir: PathBuf,
    /// Store file; `None` means the layout's default file name.
    pub store_path: Option<PathBuf>,
    pub request_delay_secs: u64,
    /// Every n-th request gets the extra long pause; 0 disables it.
    pub long_pause_every: usize,
    pub long_pause_secs: u64,
    /// URLs containing this are skipped; `None` means the layout's default,
    /// an empty string disables skipping.
    pub skip_url_substring: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageSettings {
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_url: "http://bodhicommons.org".to_string(),
            snapshot_timestamp: "20230331041108".to_string(),
            archive_base: "https://web.archive.org".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 10,
            listing: ListingSettings::default(),
            fetch: FetchSettings::default(),
            images: ImageSettings::default(),
        }
    }
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            start_page: 19,
            end_page: 65,
            output_dir: PathBuf::from("."),
            content_block_id: "block-lenin-content".to_string(),
            item_class: "views-row".to_string(),
            end_of_run_delay_secs: 10,
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            layout: Layout::Standard,
            url_dir: PathBuf::from("urls"),
            store_path: None,
            request_delay_secs: 30,
            long_pause_every: 4,
            long_pause_secs: 60,
            skip_url_substring: None,
        }
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("images"),
        }
    }
}

impl Settings {
    /// Load settings from an optional YAML file, falling back to defaults.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given; using built-in defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
        let settings = Self::from_yaml(&raw)?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| ScrapeError::Config(e.to_string()))
    }

    /// Reject settings that would make a stage misbehave before it starts.
    pub fn validate(&self) -> Result<()> {
        NaiveDateTime::parse_from_str(&self.snapshot_timestamp, SNAPSHOT_TIMESTAMP_FORMAT)
            .map_err(|e| {
                ScrapeError::Config(format!(
                    "snapshot_timestamp {:?} is not YYYYMMDDhhmmss: {e}",
                    self.snapshot_timestamp
                ))
            })?;

        for (name, value) in [("site_url", &self.site_url), ("archive_base", &self.archive_base)] {
            Url::parse(value)
                .map_err(|e| ScrapeError::Config(format!("{name} {value:?} is not a URL: {e}")))?;
        }

        if self.listing.start_page > self.listing.end_page {
            return Err(ScrapeError::Config(format!(
                "start_page {} is after end_page {}",
                self.listing.start_page, self.listing.end_page
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ScrapeError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Listing URL for one page of the configured snapshot.
    pub fn listing_page_url(&self, page: u32) -> String {
        format!(
            "{}/web/{}/{}?page={}",
            self.archive_base.trim_end_matches('/'),
            self.snapshot_timestamp,
            self.site_url,
            page
        )
    }
}

impl FetchSettings {
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.layout.default_store_name()))
    }

    pub fn skip_url_substring(&self) -> Option<String> {
        match &self.skip_url_substring {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(s.clone()),
            None => self.layout.default_skip_substring().map(str::to_string),
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            request_delay: Duration::from_secs(self.request_delay_secs),
            long_pause_every: self.long_pause_every,
            long_pause: Duration::from_secs(self.long_pause_secs),
        }
    }
}

/// Fixed politeness delays applied after each article request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub request_delay: Duration,
    pub long_pause_every: usize,
    pub long_pause: Duration,
}

impl Pacing {
    /// No waiting at all.
    pub fn none() -> Self {
        Self {
            request_delay: Duration::ZERO,
            long_pause_every: 0,
            long_pause: Duration::ZERO,
        }
    }

    /// Total delay owed after the request at 1-based `index`.
    pub fn delay_after(&self, index: usize) -> Duration {
        let long = self.long_pause_every > 0 && index % self.long_pause_every == 0;
        if long {
            self.request_delay + self.long_pause
        } else {
            self.request_delay
        }
    }

    pub async fn after_request(&self, index: usize) {
        let delay = self.delay_after(index);
        if !delay.is_zero() {
            debug!(index, ?delay, "Pausing before next request");
            sleep(delay).await;
        }
    }
}
