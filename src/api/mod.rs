//! Remote API module.
//!
//! This module provides:
//! - HTTP client for the timeline and search endpoints
//! - Paginated post streams
//! - API response types

pub mod client;
pub mod stream;
pub mod types;

pub use client::{TwitterApi, API_BASE};
pub use stream::{PostSource, TimelineStream};
pub use types::{parse_created_at, parse_post};
