//! Output path management.

use std::path::{Path, PathBuf};

use crate::config::{Config, HarvestTarget};
use crate::error::Result;
use crate::fs::naming::{is_temporary_file, sanitize_filename, sanitize_path_component};

/// Get the output directory for a harvest target.
///
/// An explicit `output_directory` wins; otherwise user timelines go to
/// `<base>/<username>` and searches to `<base>/search_<query>`.
pub fn get_output_directory(config: &Config, target: &HarvestTarget) -> Result<PathBuf> {
    if let Some(dir) = &config.options.output_directory {
        return Ok(dir.clone());
    }

    let folder = match target {
        HarvestTarget::User(name) => sanitize_path_component(name)?,
        HarvestTarget::Search(query) => format!("search_{}", sanitize_path_component(query)?),
    };

    Ok(config.download_directory().join(folder))
}

/// Get the destination path of a media file inside the output directory.
pub fn get_media_path(output_dir: &Path, filename: &str) -> Result<PathBuf> {
    Ok(output_dir.join(sanitize_filename(filename)?))
}

/// Remove temporary download files abandoned by an interrupted run.
///
/// Returns how many were removed. Failures are logged, never returned.
pub fn remove_stale_temporary_files(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot scan {} for stale files: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !is_temporary_file(&name.to_string_lossy()) {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!("Removed stale temporary file {}", entry.path().display());
                removed += 1;
            }
            Err(e) => tracing::warn!(
                "Failed to remove stale temporary file {}: {}",
                entry.path().display(),
                e
            ),
        }
    }

    removed
}
