//! Harvest state tracking.

use std::fmt;
use std::path::PathBuf;

use crate::media::MediaKind;

/// Why a harvest walk ended. Every reason is a successful end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The download cap was reached.
    CapReached,
    /// A post older than the watermark was reached.
    WatermarkReached,
    /// The stream had no more posts.
    StreamExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::CapReached => write!(f, "download cap reached"),
            StopReason::WatermarkReached => write!(f, "reached posts covered by a previous run"),
            StopReason::StreamExhausted => write!(f, "no more posts"),
        }
    }
}

/// A single file that could not be fetched.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub post_id: String,
    pub filename: String,
    pub url: String,
    pub message: String,
}

/// Counters accumulated during one walk.
#[derive(Debug, Default)]
pub struct HarvestState {
    pub posts_processed: u64,
    pub downloaded: u64,
    pub pic_count: u64,
    pub vid_count: u64,
    pub skipped_existing: u64,
    pub bytes_downloaded: u64,
    pub failures: Vec<FetchFailure>,
    /// Downloads after which the watermark could not be written.
    pub marker_failures: u64,
    /// Downloads whose modification time could not be set.
    pub timestamp_failures: u64,
}

impl HarvestState {
    /// Record a completed download.
    pub fn record_download(&mut self, kind: &MediaKind, bytes: u64) {
        self.downloaded += 1;
        self.bytes_downloaded += bytes;
        match kind {
            MediaKind::Photo => self.pic_count += 1,
            MediaKind::Video | MediaKind::AnimatedImage => self.vid_count += 1,
            MediaKind::Unrecognized(_) => {}
        }
    }

    /// Record a file skipped because it already exists.
    pub fn record_skipped(&mut self) {
        self.skipped_existing += 1;
    }

    /// Record a file that could not be fetched.
    pub fn record_failure(&mut self, failure: FetchFailure) {
        self.failures.push(failure);
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Outcome of one harvest run.
#[derive(Debug)]
pub struct HarvestSummary {
    pub output_dir: PathBuf,
    pub stop_reason: StopReason,
    pub stats: HarvestState,
    /// Watermark read at the start of the run.
    pub watermark_before: f64,
    /// Watermark persisted at the end of the run.
    pub watermark_after: f64,
}

impl HarvestSummary {
    pub fn downloaded(&self) -> u64 {
        self.stats.downloaded
    }

    pub fn skipped_existing(&self) -> u64 {
        self.stats.skipped_existing
    }

    pub fn failed(&self) -> usize {
        self.stats.failed()
    }

    /// Whether every attempted file was saved.
    ///
    /// Marker and timestamp write problems do not count against this.
    pub fn is_clean(&self) -> bool {
        self.stats.failures.is_empty()
    }

    pub fn marker_failures(&self) -> u64 {
        self.stats.marker_failures
    }
}
