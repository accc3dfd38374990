//! Configuration structures and loading logic.

use crate::config::modes::{HarvestTarget, VariantSelection};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

/// Account credentials configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// App-only bearer token for the API.
    #[serde(default)]
    pub bearer_token: String,

    /// User agent sent with API and media requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Harvest target configuration. Exactly one field must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Screen name whose timeline is harvested.
    #[serde(default)]
    pub username: Option<String>,

    /// Search query whose results are harvested.
    #[serde(default)]
    pub search: Option<String>,
}

/// Harvest options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory under which per-target folders are created.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Explicit output directory, overriding the per-target folder.
    #[serde(default)]
    pub output_directory: Option<PathBuf>,

    /// Maximum number of files downloaded per run.
    #[serde(default = "default_max_downloads")]
    pub max_downloads: u64,

    /// Posts requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Video variant selection rule.
    #[serde(default)]
    pub video_variant: VariantSelection,

    /// Whether reposts appear in user timelines.
    #[serde(default = "default_true")]
    pub include_retweets: bool,

    /// Whether to show download progress.
    #[serde(default = "default_true")]
    pub show_downloads: bool,

    /// Whether to show skipped downloads.
    #[serde(default = "default_true")]
    pub show_skipped_downloads: bool,

    /// Sleep until the rate limit window resets instead of failing.
    #[serde(default = "default_true")]
    pub wait_on_rate_limit: bool,

    /// Base delay between page requests in milliseconds.
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_directory: None,
            output_directory: None,
            max_downloads: default_max_downloads(),
            page_size: default_page_size(),
            video_variant: VariantSelection::default(),
            include_retweets: true,
            show_downloads: true,
            show_skipped_downloads: true,
            wait_on_rate_limit: true,
            page_delay_ms: default_page_delay(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            bearer_token: String::new(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("tweet-media-harvester/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_downloads() -> u64 {
    100
}

fn default_page_size() -> u32 {
    200
}

fn default_page_delay() -> u64 {
    1000
}

/// Location of the per-user configuration file, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tweet-media-harvester")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the configured harvest target.
    pub fn target(&self) -> Result<HarvestTarget> {
        let username = self.target.username.as_deref().map(str::trim);
        let search = self.target.search.as_deref().map(str::trim);

        match (username, search) {
            (Some(user), None) if !user.is_empty() => Ok(HarvestTarget::User(user.to_string())),
            (None, Some(query)) if !query.is_empty() => {
                Ok(HarvestTarget::Search(query.to_string()))
            }
            (Some(_), Some(_)) => Err(Error::ConfigValidation {
                field: "target".to_string(),
                message: "Specify either a username or a search query, not both".to_string(),
            }),
            _ => Err(Error::MissingConfig(
                "target (a username or a search query is required)".to_string(),
            )),
        }
    }

    /// Get the effective base download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.options
            .download_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
