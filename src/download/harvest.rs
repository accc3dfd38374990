//! Incremental harvesting: walk the stream, download new media, stop at the watermark.

use std::path::Path;

use crate::api::PostSource;
use crate::config::{Config, VariantSelection};
use crate::download::fetch::Fetcher;
use crate::download::state::{FetchFailure, HarvestState, HarvestSummary, StopReason};
use crate::error::{Error, Result};
use crate::fs::{get_media_path, remove_stale_temporary_files, set_file_time, WatermarkStore};
use crate::media::{extract_media, Post};

/// Per-run harvest options.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Maximum number of files downloaded in this run.
    pub max_downloads: u64,
    pub variant: VariantSelection,
    pub show_downloads: bool,
    pub show_skipped: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            max_downloads: u64::MAX,
            variant: VariantSelection::default(),
            show_downloads: true,
            show_skipped: true,
        }
    }
}

impl HarvestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_downloads: config.options.max_downloads,
            variant: config.options.video_variant,
            show_downloads: config.options.show_downloads,
            show_skipped: config.options.show_skipped_downloads,
        }
    }
}

/// Harvest media from `source` into `output_dir`.
///
/// Posts are handled strictly in stream order. The walk ends when the cap
/// is reached (checked before every download, so it can end mid-post), when
/// a post is older than the watermark read at the start of the run, or when
/// the stream runs dry. Files already present are skipped. A failed fetch
/// is recorded and the walk goes on; only a stream error or failing to
/// create the output directory aborts the run. A stream error is returned as
/// [`Error::StreamInterrupted`], carrying the counts of the partial walk.
pub async fn harvest<S, F>(
    source: &mut S,
    fetcher: &F,
    options: &HarvestOptions,
    output_dir: &Path,
) -> Result<HarvestSummary>
where
    S: PostSource + ?Sized,
    F: Fetcher + ?Sized,
{
    let mut store = WatermarkStore::ensure_directory(output_dir)?;
    let watermark = store.watermark();

    let stale = remove_stale_temporary_files(output_dir);
    if stale > 0 {
        tracing::info!("Removed {} unfinished download(s) from a previous run", stale);
    }

    tracing::info!(
        "Harvesting into {} (watermark {:.3}, cap {})",
        output_dir.display(),
        watermark,
        options.max_downloads
    );

    let mut state = HarvestState::default();

    let stop_reason = loop {
        if state.downloaded >= options.max_downloads {
            tracing::info!("Stopping after downloading {} files", state.downloaded);
            break StopReason::CapReached;
        }

        let next = match source.next_post().await {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(
                    "Post stream failed after {} download(s) and {} failure(s): {}",
                    state.downloaded,
                    state.failed(),
                    e
                );
                return Err(Error::StreamInterrupted {
                    downloaded: state.downloaded,
                    failed: state.failed(),
                    source: Box::new(e),
                });
            }
        };
        let Some(post) = next else {
            tracing::info!("End of post stream");
            break StopReason::StreamExhausted;
        };

        let post_time = post.timestamp();
        if post_time < watermark {
            tracing::info!(
                "Stopping at post {} from {}, which is older than the watermark",
                post.id,
                post.created_at
            );
            break StopReason::WatermarkReached;
        }

        state.posts_processed += 1;

        if harvest_post(&post, post_time, fetcher, options, output_dir, &mut store, &mut state)
            .await
            == PostOutcome::CapReached
        {
            tracing::info!("Stopping after downloading {} files", state.downloaded);
            break StopReason::CapReached;
        }
    };

    Ok(HarvestSummary {
        output_dir: output_dir.to_path_buf(),
        stop_reason,
        stats: state,
        watermark_before: watermark,
        watermark_after: store.watermark(),
    })
}

#[derive(Debug, PartialEq, Eq)]
enum PostOutcome {
    Done,
    CapReached,
}

async fn harvest_post<F: Fetcher + ?Sized>(
    post: &Post,
    post_time: f64,
    fetcher: &F,
    options: &HarvestOptions,
    output_dir: &Path,
    store: &mut WatermarkStore,
    state: &mut HarvestState,
) -> PostOutcome {
    for descriptor in extract_media(post, options.variant) {
        if state.downloaded >= options.max_downloads {
            return PostOutcome::CapReached;
        }

        let path = match get_media_path(output_dir, &descriptor.filename) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Refusing to write {}: {}", descriptor.filename, e);
                state.record_failure(FetchFailure {
                    post_id: post.id.clone(),
                    filename: descriptor.filename,
                    url: descriptor.url,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if path.exists() {
            if options.show_skipped {
                tracing::debug!("Skipping existing file: {}", descriptor.filename);
            }
            state.record_skipped();
            continue;
        }

        tracing::debug!("Fetching {} -> {}", descriptor.url, path.display());

        match fetcher.fetch(&descriptor.url, &path).await {
            Ok(bytes) => {
                if let Err(e) = set_file_time(&path, post_time) {
                    tracing::warn!("Failed to set time of {}: {}", path.display(), e);
                    state.timestamp_failures += 1;
                }
                state.record_download(&descriptor.kind, bytes);

                if let Err(e) = store.advance(post_time) {
                    tracing::warn!(
                        "Failed to update watermark {}: {}",
                        store.marker_path().display(),
                        e
                    );
                    state.marker_failures += 1;
                }

                if options.show_downloads {
                    tracing::info!("Downloaded: {}", path.display());
                }
            }
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", descriptor.url, e);
                state.record_failure(FetchFailure {
                    post_id: post.id.clone(),
                    filename: descriptor.filename,
                    url: descriptor.url,
                    message: e.to_string(),
                });
            }
        }
    }

    PostOutcome::Done
}
