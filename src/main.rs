//! # Wayback Scraper
//!
//! Harvests article URLs and article metadata for one site from Internet
//! Archive snapshots, and keeps them in a resumable JSON store.
//!
//! ## Usage
//!
//! ```sh
//! wayback_scraper collect -o urls
//! wayback_scraper fetch --url-dir urls
//! wayback_scraper images
//! ```
//!
//! ## Architecture
//!
//! Each subcommand is one sequential loop:
//! 1. **collect**: paginate the archived listing, one URL file per page
//! 2. **fetch**: scrape every URL not yet in the store, rewriting the store
//!    after each one
//! 3. **images**: download the images referenced by stored records
//!
//! Requests are spaced by fixed delays; failures are logged and skipped, and
//! anything not stored is attempted again on the next run.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod client;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use client::HttpFetcher;
use config::Settings;
use outputs::json::ArticleStore;
use outputs::url_files::read_url_files;
use pipeline::{FetchContext, download_images};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("wayback_scraper starting up");

    // Parse CLI, layer flags over the config file
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    if let Err(e) = settings.validate() {
        error!(error = %e, "Invalid settings");
        return Err(e.into());
    }
    debug!(?settings, "Resolved settings");

    let fetcher = HttpFetcher::new(&settings.user_agent, settings.request_timeout())?;

    match args.command {
        Command::Collect(_) => {
            if let Err(e) = ensure_writable_dir(&settings.listing.output_dir).await {
                error!(
                    path = %settings.listing.output_dir.display(),
                    error = %e,
                    "URL output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }
            scrapers::listing::index_pages(&fetcher, &settings).await?;
        }
        Command::Fetch(_) => {
            let layout = settings.fetch.layout;
            let urls = read_url_files(&settings.fetch.url_dir, layout.url_file_filter()).await?;
            let store = ArticleStore::open(settings.fetch.store_path()).await?;

            let mut ctx = FetchContext {
                fetcher,
                layout,
                store,
                pacing: settings.fetch.pacing(),
                skip_substring: settings.fetch.skip_url_substring(),
            };
            ctx.fetch_articles(&urls).await?;
        }
        Command::Images(_) => {
            let store_path = settings.fetch.store_path();
            let store = match ArticleStore::open_existing(&store_path).await {
                Ok(store) => store,
                Err(e) => {
                    error!(
                        path = %store_path.display(),
                        error = %e,
                        "Cannot read article store (run `fetch` first or pass --store)"
                    );
                    return Err(e.into());
                }
            };
            let dir = &settings.images.output_dir;
            if let Err(e) = ensure_writable_dir(dir).await {
                error!(path = %dir.display(), error = %e, "Image directory is not writable");
                return Err(e);
            }
            download_images(&fetcher, &store, dir).await;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
