//! Error types shared by the collector, fetcher and image stages.
//!
//! Every per-item failure is a [`ScrapeError`]. The stage loops log it and
//! move on; only startup failures (config, store load, output directories)
//! bubble up to `main`.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// A required element was not present in the parsed page.
    #[error("missing {field} in page")]
    MissingElement { field: &'static str },

    /// A link or configured URL could not be parsed or joined.
    #[error("cannot resolve {href:?}: {source}")]
    InvalidUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },

    /// A resolved image source is not fetchable over HTTP.
    #[error("not an http(s) URL: {0}")]
    UnsupportedScheme(String),

    /// Filesystem failure, tagged with the path involved.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store could not be serialized.
    #[error("serializing store: {0}")]
    Json(#[from] serde_json::Error),

    /// The on-disk store exists but is not a JSON array of records.
    #[error("store {} is corrupt: {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },

    /// Settings failed validation or the YAML file did not parse.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn missing(field: &'static str) -> Self {
        ScrapeError::MissingElement { field }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::Io {
            path: path.into(),
            source,
        }
    }
}
