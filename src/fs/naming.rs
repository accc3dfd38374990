//! Filename validation and temporary-file naming.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Error, Result};

/// Suffix of in-flight download files.
pub const PART_SUFFIX: &str = ".part";

/// Validate and sanitize a filename by removing or replacing invalid characters.
///
/// Returns an error if the filename contains path traversal patterns.
pub fn sanitize_filename(name: &str) -> Result<String> {
    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    // Hidden names would collide with the marker and temporary files
    if name.starts_with('.') {
        return Err(Error::InvalidFilename(format!(
            "Hidden filenames not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Sanitize a path component (folder name) with less strict validation.
///
/// Used for folder names derived from usernames and search queries, where
/// problematic characters are replaced rather than rejected.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '#' | ' ' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim_start_matches('.').to_string();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '_') {
        return Err(Error::InvalidFilename(format!(
            "Path component '{}' is empty after sanitizing",
            name
        )));
    }

    Ok(sanitized)
}

/// Temporary sibling path a download is streamed into before the final rename.
pub fn temporary_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = destination.parent().unwrap_or(Path::new("."));

    parent.join(format!(".{}.{}{}", name, Uuid::new_v4().simple(), PART_SUFFIX))
}

/// Whether a filename belongs to an in-flight or abandoned download.
pub fn is_temporary_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PART_SUFFIX)
}
