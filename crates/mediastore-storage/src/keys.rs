//! Shared key generation for storage backends.
//!
//! Originals live under `media/`, optionally organized into date prefixes.
//! Thumbnails sit alongside their original with the size name appended, so a
//! directory listing keeps variants next to their source.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a storage key for an original file.
///
/// The filename gains a short unique suffix before its extension so repeated
/// uploads of the same name never collide. With a date format configured the
/// key becomes `media/{formatted_date}/{filename}`.
pub fn media_key(filename: &str, date_format: Option<&str>, now: DateTime<Utc>) -> String {
    let unique = unique_filename(filename);
    match date_format {
        Some(format) => format!("media/{}/{}", now.format(format), unique),
        None => format!("media/{}", unique),
    }
}

/// Insert a unique suffix into a filename, preserving the extension.
fn unique_filename(filename: &str) -> String {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, suffix, ext),
        _ => format!("{}-{}", filename, suffix),
    }
}

/// Key for a thumbnail variant, derived from the original's key.
///
/// `media/2026/08/photo-ab12cd34.jpg` with size "small" and extension "jpg"
/// becomes `media/2026/08/photo-ab12cd34-small.jpg`.
pub fn thumbnail_key(original_key: &str, size_name: &str, extension: &str) -> String {
    match original_key.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => {
            format!("{}-{}.{}", stem, size_name, extension)
        }
        _ => format!("{}-{}.{}", original_key, size_name, extension),
    }
}
