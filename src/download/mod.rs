//! Download module.
//!
//! This module provides:
//! - The fetch boundary and its HTTP implementation
//! - Harvest state and run summaries
//! - The incremental harvesting engine

pub mod fetch;
pub mod harvest;
pub mod state;

pub use fetch::{Fetcher, HttpFetcher};
pub use harvest::{harvest, HarvestOptions};
pub use state::{FetchFailure, HarvestState, HarvestSummary, StopReason};
