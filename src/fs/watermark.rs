//! Watermark persistence.
//!
//! The watermark is the creation time of the newest post whose media was
//! downloaded by an earlier run. It lives in the modification time of a
//! zero-byte marker file inside the output directory, so the directory is
//! the only state the harvester keeps.

use std::fs::{self, File, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Name of the marker file inside the output directory.
pub const MARKER_FILE: &str = ".timestamp";

/// Reads and advances the watermark of one output directory.
#[derive(Debug)]
pub struct WatermarkStore {
    marker: PathBuf,
    current: f64,
}

impl WatermarkStore {
    /// Create the output directory if needed and read its watermark.
    ///
    /// A missing or unreadable marker yields a watermark of `0`. Failing to
    /// create the directory is the only error.
    pub fn ensure_directory(dir: &Path) -> Result<Self> {
        let marker = dir.join(MARKER_FILE);

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| Error::OutputDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
            tracing::debug!("Created output directory {}", dir.display());
            return Ok(Self { marker, current: 0.0 });
        }

        if !dir.is_dir() {
            return Err(Error::OutputDirectory {
                path: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
            });
        }

        let current = read_marker(&marker);
        Ok(Self { marker, current })
    }

    /// Current watermark in fractional epoch seconds.
    pub fn watermark(&self) -> f64 {
        self.current
    }

    /// Path of the marker file.
    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    /// Record a successful download of media from a post created at `post_time`.
    ///
    /// Creates the marker if absent and moves its timestamp forward to
    /// `post_time`. The watermark never moves backwards. Returns whether it
    /// changed.
    pub fn advance(&mut self, post_time: f64) -> Result<bool> {
        let exists = self.marker.exists();
        if exists && post_time <= self.current {
            return Ok(false);
        }

        let target = if exists {
            post_time
        } else {
            post_time.max(self.current)
        };

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.marker)?;
        apply_time(&file, target)?;

        let changed = target != self.current;
        self.current = target;
        Ok(changed)
    }
}

/// Read the marker's modification time, degrading to `0` on any failure.
pub fn read_marker(marker: &Path) -> f64 {
    let modified = match fs::metadata(marker).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    "Cannot read watermark from {}: {}; scanning from the beginning",
                    marker.display(),
                    e
                );
            }
            return 0.0;
        }
    };

    match modified.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Set both access and modification time of a file.
pub fn set_file_time(path: &Path, secs: f64) -> io::Result<()> {
    let file = File::options().write(true).open(path)?;
    apply_time(&file, secs)
}

fn apply_time(file: &File, secs: f64) -> io::Result<()> {
    let time = system_time_from_secs(secs);
    file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
}

fn system_time_from_secs(secs: f64) -> SystemTime {
    if secs >= 0.0 {
        UNIX_EPOCH + Duration::from_secs_f64(secs)
    } else {
        UNIX_EPOCH - Duration::from_secs_f64(-secs)
    }
}
