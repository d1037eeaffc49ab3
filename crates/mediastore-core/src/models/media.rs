//! Media item models
//!
//! The catalog record for an ingested file, plus the filter/listing DTOs the
//! library surface consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::hash::ContentHash;
use super::image::ImageDimensions;

/// Media type classification derived from the MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Other,
}

impl MediaType {
    /// Determine media type from MIME type
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else if mime.starts_with("application/pdf")
            || mime.contains("document")
            || mime.contains("spreadsheet")
            || mime.contains("presentation")
            || mime.starts_with("text/")
        {
            Self::Document
        } else if mime.contains("zip")
            || mime.contains("tar")
            || mime.contains("rar")
            || mime.contains("gzip")
        {
            Self::Archive
        } else {
            Self::Other
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self::Other
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Archive => "archive",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Derived thumbnail variant, keyed uniquely by (media_id, size_name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub size_name: String,
    pub width: u32,
    pub height: u32,
    /// Storage key of the derived artifact
    pub path: String,
    pub url: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// A catalog record for an ingested file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// URL-safe slug derived from the filename
    pub slug: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub mime_type: String,
    pub media_type: MediaType,
    /// File size in bytes
    pub size: u64,
    /// Storage key of the backing bytes
    pub path: String,
    /// Public URL
    pub url: String,
    /// Owning folder; None = root
    pub folder_id: Option<Uuid>,
    pub dimensions: Option<ImageDimensions>,
    /// Duration in seconds for media with a time axis
    pub duration: Option<f64>,
    pub content_hash: ContentHash,
    pub thumbnails: Vec<Thumbnail>,
    pub tags: Vec<String>,
    /// Times the item has been referenced by consuming content
    pub usage_count: u64,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; set timestamp = hidden from listings, bytes retained
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MediaItem {
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        path: impl Into<String>,
        content_hash: ContentHash,
    ) -> Self {
        let filename = filename.into();
        let mime_type = mime_type.into();
        let slug = sanitize_filename(&filename);
        let media_type = MediaType::from_mime(&mime_type);
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            filename,
            slug,
            title: None,
            description: None,
            alt_text: None,
            mime_type,
            media_type,
            size,
            path: path.into(),
            url: String::new(),
            folder_id: None,
            dimensions: None,
            duration: None,
            content_hash,
            thumbnails: Vec::new(),
            tags: Vec::new(),
            usage_count: 0,
            uploaded_by: None,
            uploaded_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.media_type, MediaType::Image)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Thumbnail URL for a named size, if generated
    pub fn thumbnail_url(&self, size_name: &str) -> Option<&str> {
        self.thumbnails
            .iter()
            .find(|t| t.size_name == size_name)
            .map(|t| t.url.as_str())
    }
}

/// Flags controlling a single upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOptions {
    pub folder_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub tags: Vec<String>,
    pub uploaded_by: Option<Uuid>,
    pub optimize: bool,
    pub generate_thumbnails: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            folder_id: None,
            title: None,
            description: None,
            alt_text: None,
            tags: Vec::new(),
            uploaded_by: None,
            optimize: true,
            generate_thumbnails: true,
        }
    }
}

/// Listing/search filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaFilter {
    pub media_type: Option<MediaType>,
    pub folder_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    pub search: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub include_deleted: bool,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Paginated listing response
#[derive(Debug, Clone, Serialize)]
pub struct MediaListResponse {
    pub items: Vec<MediaItem>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Library-wide counts and sizes over non-deleted items
#[derive(Debug, Clone, Default, Serialize)]
pub struct LibraryStats {
    pub total_items: u64,
    pub total_size: u64,
    pub image_count: u64,
    pub video_count: u64,
    pub audio_count: u64,
    pub document_count: u64,
    pub other_count: u64,
}

fn unsafe_chars() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"[^a-zA-Z0-9._-]").expect("static regex"))
}

fn slug_chars() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"[^a-z0-9-]+").expect("static regex"))
}

/// Sanitize a filename into a URL-safe form, preserving the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let name = std::path::Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");

    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let sanitized = unsafe_chars().replace_all(name, "-").to_lowercase();

    if ext.is_empty() {
        sanitized
    } else {
        format!("{}.{}", sanitized, ext.to_lowercase())
    }
}

/// Create a URL-safe slug from a display name.
pub fn slugify(name: &str) -> String {
    slug_chars()
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Format bytes to a human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
