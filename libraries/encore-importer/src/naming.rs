//! Upload limits and the "Artist - Title" filename convention

use crate::{ImportError, Result};
use encore_core::types::UNKNOWN_ARTIST;

/// Largest accepted file: 50 MiB
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Extensions accepted for import (lowercase)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "wav", "ogg", "flac", "opus"];

const SEPARATOR: &str = " - ";

/// Final path component, tolerant of both separator styles
fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
}

/// Lowercased extension, if the name has one
pub fn extension(file_name: &str) -> Option<String> {
    let name = base_name(file_name);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// File name without its extension
pub fn stem(file_name: &str) -> &str {
    let name = base_name(file_name);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem,
        _ => name,
    }
}

pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Size and format checks, run before any byte is written
///
/// Returns the normalized extension.
pub fn validate(file_name: &str, size_bytes: u64) -> Result<String> {
    if size_bytes > MAX_FILE_SIZE {
        return Err(ImportError::FileTooLarge {
            size: size_bytes,
            limit: MAX_FILE_SIZE,
        });
    }

    match extension(file_name) {
        Some(ext) if is_supported_extension(&ext) => Ok(ext),
        Some(ext) => Err(ImportError::UnsupportedFormat(ext)),
        None => Err(ImportError::UnsupportedFormat(base_name(file_name).to_string())),
    }
}

/// Derive `(artist, title)` from a file name
///
/// `"Artist - Title.mp3"` splits on the first `" - "`. Anything else
/// uses the whole stem as the title and the placeholder artist.
pub fn parse_file_name(file_name: &str) -> (String, String) {
    let stem = stem(file_name);

    if let Some((artist, title)) = stem.split_once(SEPARATOR) {
        let (artist, title) = (artist.trim(), title.trim());
        if !artist.is_empty() && !title.is_empty() {
            return (artist.to_string(), title.to_string());
        }
    }

    (UNKNOWN_ARTIST.to_string(), stem.trim().to_string())
}
