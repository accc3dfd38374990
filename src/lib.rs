//! Tweet Media Harvester - incremental media downloader for post timelines.
//!
//! This library walks a reverse-chronological stream of posts, extracts the
//! photos, videos and animated images attached to them, and saves each file
//! once into an output directory. The directory remembers the newest post
//! it holds, so the next run stops as soon as it reaches older posts.
//!
//! # Features
//!
//! - User timeline and search streams with lazy pagination
//! - Deterministic media selection (large JPEG photos, first or best video variant)
//! - Skip-if-present deduplication and a persisted watermark
//! - Temporary-file downloads that never leave partial media behind
//! - Download cap per run
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tweet_media_harvester::{harvest, HarvestOptions, HarvestTarget, HttpFetcher, TimelineStream, TwitterApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = TwitterApi::new("bearer-token".to_string(), "my-agent/1.0")?;
//!     let mut stream = TimelineStream::new(&api, HarvestTarget::User("nasa".into()));
//!     let fetcher = HttpFetcher::new("my-agent/1.0")?;
//!
//!     let options = HarvestOptions { max_downloads: 20, ..Default::default() };
//!     let summary = harvest(&mut stream, &fetcher, &options, Path::new("nasa")).await?;
//!     println!("{} new files ({})", summary.downloaded(), summary.stop_reason);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;

// Re-exports for convenience
pub use api::{PostSource, TimelineStream, TwitterApi};
pub use config::{Config, HarvestTarget, VariantSelection};
pub use download::{
    harvest, Fetcher, HarvestOptions, HarvestSummary, HttpFetcher, StopReason,
};
pub use error::{Error, Result};
pub use fs::WatermarkStore;
pub use media::{extract_media, MediaDescriptor, MediaEntity, MediaKind, Post};
