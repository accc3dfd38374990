//! Harvest target and variant selection definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the post stream is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestTarget {
    /// A user's own timeline, by screen name.
    User(String),
    /// A search query.
    Search(String),
}

impl fmt::Display for HarvestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarvestTarget::User(name) => write!(f, "@{}", name),
            HarvestTarget::Search(query) => write!(f, "search \"{}\"", query),
        }
    }
}

/// How a video or animated image variant is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantSelection {
    /// First listed variant (default).
    #[default]
    First,
    /// Variant with the highest declared bitrate.
    HighestBitrate,
}

impl fmt::Display for VariantSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantSelection::First => write!(f, "first"),
            VariantSelection::HighestBitrate => write!(f, "highest_bitrate"),
        }
    }
}

impl FromStr for VariantSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "first" => Ok(VariantSelection::First),
            "highest_bitrate" => Ok(VariantSelection::HighestBitrate),
            _ => Err(format!("Unknown variant selection: {}", s)),
        }
    }
}
