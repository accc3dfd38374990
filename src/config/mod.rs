//! Configuration module for the tweet-media-harvester.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Harvest target and variant selection types
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{default_config_path, AccountConfig, Config, OptionsConfig, TargetConfig};
pub use modes::{HarvestTarget, VariantSelection};
pub use validation::{parse_username, validate_config, MAX_PAGE_SIZE};
