//! Command-line interface definitions for the Wayback scraper.
//!
//! Every option is optional: unset flags fall back to the `--config` YAML
//! file, then to the built-in defaults in [`Settings`]. Global options can
//! also come from environment variables.

use crate::config::Settings;
use crate::scrapers::Layout;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Wayback scraper.
///
/// # Examples
///
/// ```sh
/// # Harvest listing pages 19..=65 into ./urls
/// wayback_scraper collect -o urls
///
/// # Scrape every collected URL into backup.json, resuming where it left off
/// wayback_scraper fetch --url-dir urls
///
/// # Same for the beta host, with a YAML config
/// wayback_scraper --config bodhi.yaml fetch --layout beta
///
/// # Download article images referenced by the store
/// wayback_scraper images --store backup.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, env = "WAYBACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Site whose archived pages are scraped
    #[arg(long, env = "WAYBACK_SITE_URL")]
    pub site_url: Option<String>,

    /// Snapshot timestamp (YYYYMMDDhhmmss)
    #[arg(short, long, env = "WAYBACK_TIMESTAMP")]
    pub timestamp: Option<String>,

    /// User-Agent header sent with every request
    #[arg(long, env = "WAYBACK_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Paginate the archived listing and write one URL file per page
    Collect(CollectArgs),
    /// Scrape article URLs from URL files into the JSON store
    Fetch(FetchArgs),
    /// Download images referenced by records in the JSON store
    Images(ImagesArgs),
}

#[derive(Args, Debug, Default)]
pub struct CollectArgs {
    /// First listing page
    #[arg(long)]
    pub start_page: Option<u32>,

    /// Last listing page (inclusive)
    #[arg(long)]
    pub end_page: Option<u32>,

    /// Directory for page_N_urls.txt files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Element id of the listing's content block
    #[arg(long)]
    pub block_id: Option<String>,

    /// Class of each list item inside the content block
    #[arg(long)]
    pub item_class: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct FetchArgs {
    /// Page layout to extract fields from
    #[arg(short, long, value_enum)]
    pub layout: Option<Layout>,

    /// Directory holding the URL files
    #[arg(short, long)]
    pub url_dir: Option<PathBuf>,

    /// JSON store (defaults to the layout's store file)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Seconds to wait after every request
    #[arg(long)]
    pub delay_secs: Option<u64>,

    /// Extra pause after every n-th request (0 disables)
    #[arg(long)]
    pub long_pause_every: Option<usize>,

    /// Length of the extra pause in seconds
    #[arg(long)]
    pub long_pause_secs: Option<u64>,

    /// Skip URLs containing this text (empty string disables skipping)
    #[arg(long)]
    pub skip: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ImagesArgs {
    /// Layout whose default store to read
    #[arg(short, long, value_enum)]
    pub layout: Option<Layout>,

    /// JSON store to read image sources from
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Directory to save images into
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

fn set<T>(target: &mut T, value: &Option<T>)
where
    T: Clone,
{
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl Cli {
    /// Overlay every flag that was given onto `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        set(&mut settings.site_url, &self.site_url);
        set(&mut settings.snapshot_timestamp, &self.timestamp);
        set(&mut settings.user_agent, &self.user_agent);
        set(&mut settings.request_timeout_secs, &self.timeout_secs);

        match &self.command {
            Command::Collect(args) => {
                let listing = &mut settings.listing;
                set(&mut listing.start_page, &args.start_page);
                set(&mut listing.end_page, &args.end_page);
                set(&mut listing.output_dir, &args.output_dir);
                set(&mut listing.content_block_id, &args.block_id);
                set(&mut listing.item_class, &args.item_class);
            }
            Command::Fetch(args) => {
                let fetch = &mut settings.fetch;
                set(&mut fetch.layout, &args.layout);
                set(&mut fetch.url_dir, &args.url_dir);
                if args.store.is_some() {
                    fetch.store_path = args.store.clone();
                }
                set(&mut fetch.request_delay_secs, &args.delay_secs);
                set(&mut fetch.long_pause_every, &args.long_pause_every);
                set(&mut fetch.long_pause_secs, &args.long_pause_secs);
                if args.skip.is_some() {
                    fetch.skip_url_substring = args.skip.clone();
                }
            }
            Command::Images(args) => {
                set(&mut settings.fetch.layout, &args.layout);
                if args.store.is_some() {
                    settings.fetch.store_path = args.store.clone();
                }
                set(&mut settings.images.output_dir, &args.output_dir);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_collect() {
        let cli = Cli::parse_from([
            "wayback_scraper",
            "collect",
            "--start-page",
            "0",
            "--end-page",
            "3",
            "-o",
            "./urls",
        ]);

        match &cli.command {
            Command::Collect(args) => {
                assert_eq!(args.start_page, Some(0));
                assert_eq!(args.end_page, Some(3));
                assert_eq!(args.output_dir, Some(PathBuf::from("./urls")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_fetch_layout() {
        let cli = Cli::parse_from(["wayback_scraper", "fetch", "-l", "beta", "-u", "links"]);
        match &cli.command {
            Command::Fetch(args) => {
                assert_eq!(args.layout, Some(Layout::Beta));
                assert_eq!(args.url_dir, Some(PathBuf::from("links")));
                assert_eq!(args.store, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_layout() {
        let res = Cli::try_parse_from(["wayback_scraper", "fetch", "--layout", "mobile"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_flags_override_file_settings() {
        let mut settings = Settings::from_yaml(
            "snapshot_timestamp: \"20220101000000\"\nfetch:\n  request_delay_secs: 5\n  long_pause_secs: 7\n",
        )
        .unwrap();
        let cli = Cli::parse_from([
            "wayback_scraper",
            "--timestamp",
            "20230127184806",
            "fetch",
            "--delay-secs",
            "0",
            "--skip",
            "",
        ]);

        cli.apply(&mut settings);

        assert_eq!(settings.snapshot_timestamp, "20230127184806");
        assert_eq!(settings.fetch.request_delay_secs, 0);
        // untouched by flags, kept from the file
        assert_eq!(settings.fetch.long_pause_secs, 7);
        assert_eq!(settings.fetch.skip_url_substring(), None);
    }

    #[test]
    fn test_env_overrides_file_and_loses_to_flag() {
        // No other test parses or asserts the user agent.
        unsafe { std::env::set_var("WAYBACK_USER_AGENT", "agent-from-env") };

        let yaml = "user_agent: agent-from-yaml\n";
        let mut from_env = Settings::from_yaml(yaml).unwrap();
        Cli::parse_from(["wayback_scraper", "images"]).apply(&mut from_env);

        let mut from_flag = Settings::from_yaml(yaml).unwrap();
        Cli::parse_from(["wayback_scraper", "--user-agent", "agent-from-flag", "images"])
            .apply(&mut from_flag);

        unsafe { std::env::remove_var("WAYBACK_USER_AGENT") };

        assert_eq!(from_env.user_agent, "agent-from-env");
        assert_eq!(from_flag.user_agent, "agent-from-flag");
    }

    #[test]
    fn test_images_store_override() {
        let mut settings = Settings::default();
        let cli = Cli::parse_from(["wayback_scraper", "images", "-l", "beta", "-o", "pics"]);
        cli.apply(&mut settings);
        assert_eq!(settings.fetch.store_path(), PathBuf::from("backup_beta.json"));
        assert_eq!(settings.images.output_dir, PathBuf::from("pics"));
    }
}
