//! Filesystem module.
//!
//! Provides:
//! - Filename validation and temporary-file naming
//! - Output path management
//! - Watermark persistence

pub mod naming;
pub mod paths;
pub mod watermark;

pub use naming::{is_temporary_file, sanitize_filename, sanitize_path_component, temporary_path};
pub use paths::{get_media_path, get_output_directory, remove_stale_temporary_files};
pub use watermark::{set_file_time, WatermarkStore, MARKER_FILE};
