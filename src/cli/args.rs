//! Command-line argument definitions using clap.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, VariantSelection};

/// Tweet media harvester CLI.
#[derive(Parser, Debug)]
#[command(
    name = "tweet-media-harvester",
    version,
    about = "Incrementally download images and videos from a timeline or search",
    long_about = "Downloads photos, videos and animated GIFs attached to the posts of a user \
                  timeline or a search, newest first.\n\n\
                  Each output directory remembers the newest post it holds, so later runs stop \
                  as soon as they reach media that was already harvested.",
    group(ArgGroup::new("target").args(["user", "search"]))
)]
pub struct Args {
    /// Screen name (or profile URL) whose timeline is harvested.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Search query whose results are harvested.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Maximum number of files to download in this run.
    #[arg(short = 'n', long = "count")]
    pub max_downloads: Option<u64>,

    /// Base directory for per-target folders.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Exact output directory (overrides the per-target folder).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// App-only bearer token.
    #[arg(short, long, env = "TWEET_BEARER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Video variant selection.
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Leave reposts out of user timelines.
    #[arg(long)]
    pub no_retweets: bool,

    /// Hide download progress information.
    #[arg(long, short)]
    pub quiet: bool,

    /// Show information about skipped downloads.
    #[arg(long)]
    pub show_skipped: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI variant selection argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantArg {
    /// First listed variant.
    First,
    /// Highest declared bitrate.
    HighestBitrate,
}

impl From<VariantArg> for VariantSelection {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::First => VariantSelection::First,
            VariantArg::HighestBitrate => VariantSelection::HighestBitrate,
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        // A target on the command line replaces the configured one
        if self.user.is_some() || self.search.is_some() {
            config.target.username = self.user;
            config.target.search = self.search;
        }

        if let Some(token) = self.token {
            config.account.bearer_token = token;
        }

        if let Some(max) = self.max_downloads {
            config.options.max_downloads = max;
        }

        if let Some(dir) = self.download_directory {
            config.options.download_directory = Some(dir);
        }

        if let Some(dir) = self.output {
            config.options.output_directory = Some(dir);
        }

        if let Some(variant) = self.variant {
            config.options.video_variant = variant.into();
        }

        // Boolean flags (only override if set to non-default)
        if self.no_retweets {
            config.options.include_retweets = false;
        }

        if self.quiet {
            config.options.show_downloads = false;
            config.options.show_skipped_downloads = false;
        }

        if self.show_skipped {
            config.options.show_skipped_downloads = true;
        }
    }
}
