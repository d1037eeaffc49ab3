//! Engine settings
//!
//! A single settings struct covers storage, upload limits, image processing,
//! thumbnail presets, organization, and chunked uploads. Loaded and persisted
//! as JSON.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::image::{default_image_sizes, ImageSize};
use crate::models::StorageBackend;

/// Media engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSettings {
    // Storage
    pub storage_backend: StorageBackend,
    /// Root directory for local storage
    pub storage_path: String,
    /// Base URL media files are served under
    pub base_url: String,
    /// Serve URLs from a CDN instead of base_url when set
    pub cdn_enabled: bool,
    pub cdn_url: String,

    // Upload limits
    /// Maximum file size in bytes
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
    pub max_filename_length: usize,

    // Image processing
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// WebP quality (1-100)
    pub webp_quality: u8,
    /// Images wider than this are downscaled during optimization
    pub max_image_width: u32,
    /// Images taller than this are downscaled during optimization
    pub max_image_height: u32,
    pub auto_optimize: bool,

    // Thumbnails
    pub generate_thumbnails: bool,
    pub image_sizes: Vec<ImageSize>,

    // Organization
    /// Place files under date-derived prefixes
    pub organize_by_date: bool,
    /// strftime format for the date prefix
    pub date_format: String,
    pub slugify_filenames: bool,
    /// Detect duplicate uploads by content hash
    pub deduplicate: bool,

    // Chunked uploads
    /// Chunk size in bytes
    pub chunk_size: u64,
    /// Hours before an unfinished session expires
    pub chunk_expiry_hours: i64,

    // S3 (credentials come from the environment)
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub s3_prefix: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Local,
            storage_path: "uploads/media".to_string(),
            base_url: "/media".to_string(),
            cdn_enabled: false,
            cdn_url: String::new(),

            max_file_size: 100 * 1024 * 1024,
            allowed_extensions: [
                // Images
                "jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "ico",
                // Videos
                "mp4", "webm", "ogv", "mov", "avi", "mkv",
                // Audio
                "mp3", "ogg", "wav", "flac", "m4a",
                // Documents
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv",
                // Archives
                "zip", "rar", "7z", "tar", "gz",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            allowed_mime_types: [
                // Images
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/webp",
                "image/svg+xml",
                "image/bmp",
                "image/x-icon",
                // Videos
                "video/mp4",
                "video/webm",
                "video/ogg",
                "video/quicktime",
                "video/x-msvideo",
                "video/x-matroska",
                // Audio
                "audio/mpeg",
                "audio/ogg",
                "audio/wav",
                "audio/flac",
                "audio/mp4",
                // Documents
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "application/vnd.ms-powerpoint",
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                "text/plain",
                "text/csv",
                // Archives
                "application/zip",
                "application/x-rar-compressed",
                "application/x-7z-compressed",
                "application/x-tar",
                "application/gzip",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_filename_length: 255,

            jpeg_quality: 85,
            webp_quality: 80,
            max_image_width: 4096,
            max_image_height: 4096,
            auto_optimize: true,

            generate_thumbnails: true,
            image_sizes: default_image_sizes(),

            organize_by_date: true,
            date_format: "%Y/%m".to_string(),
            slugify_filenames: true,
            deduplicate: true,

            chunk_size: 5 * 1024 * 1024,
            chunk_expiry_hours: 24,

            s3_bucket: String::new(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            s3_prefix: String::new(),
        }
    }
}

impl MediaSettings {
    /// Load settings from a JSON file
    pub fn load(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Persist settings to a JSON file
    pub fn save(&self, path: &str) -> AppResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Effective base URL (CDN when enabled and configured)
    pub fn effective_base_url(&self) -> &str {
        if self.cdn_enabled && !self.cdn_url.is_empty() {
            &self.cdn_url
        } else {
            &self.base_url
        }
    }

    pub fn is_extension_allowed(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    pub fn is_mime_type_allowed(&self, mime: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == mime)
    }

    /// Thumbnail sizes currently enabled
    pub fn enabled_sizes(&self) -> Vec<&ImageSize> {
        self.image_sizes.iter().filter(|s| s.enabled).collect()
    }

    /// Validate settings, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.storage_path.is_empty() {
            errors.push("Storage path cannot be empty".to_string());
        }

        if self.max_file_size == 0 {
            errors.push("Max file size must be greater than 0".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            errors.push("JPEG quality must be between 1 and 100".to_string());
        }

        if self.webp_quality == 0 || self.webp_quality > 100 {
            errors.push("WebP quality must be between 1 and 100".to_string());
        }

        if self.chunk_size == 0 {
            errors.push("Chunk size must be greater than 0".to_string());
        }

        if self.chunk_expiry_hours <= 0 {
            errors.push("Chunk expiry must be at least one hour".to_string());
        }

        for size in &self.image_sizes {
            if size.quality == 0 || size.quality > 100 {
                errors.push(format!(
                    "Image size '{}' quality must be between 1 and 100",
                    size.name
                ));
            }
        }

        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.is_empty() {
            errors.push("S3 bucket name is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and collapse problems into one error.
    pub fn ensure_valid(&self) -> AppResult<()> {
        self.validate()
            .map_err(|errors| AppError::InvalidInput(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = MediaSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.storage_backend, StorageBackend::Local);
        assert_eq!(settings.chunk_size, 5 * 1024 * 1024);
    }

    #[test]
    fn test_extension_and_mime_checks() {
        let settings = MediaSettings::default();
        assert!(settings.is_extension_allowed("JPG"));
        assert!(settings.is_extension_allowed("pdf"));
        assert!(!settings.is_extension_allowed("exe"));
        assert!(settings.is_mime_type_allowed("image/png"));
        assert!(!settings.is_mime_type_allowed("application/x-msdownload"));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut settings = MediaSettings::default();
        settings.storage_path = String::new();
        settings.jpeg_quality = 0;
        settings.chunk_size = 0;

        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_s3_requires_bucket() {
        let mut settings = MediaSettings::default();
        settings.storage_backend = StorageBackend::S3;
        assert!(settings.validate().is_err());

        settings.s3_bucket = "media".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_effective_base_url_prefers_cdn() {
        let mut settings = MediaSettings::default();
        assert_eq!(settings.effective_base_url(), "/media");

        settings.cdn_enabled = true;
        settings.cdn_url = "https://cdn.example.com".to_string();
        assert_eq!(settings.effective_base_url(), "https://cdn.example.com");
    }

    #[test]
    fn test_settings_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let path = path.to_str().unwrap();

        let mut settings = MediaSettings::default();
        settings.max_file_size = 42;
        settings.save(path).unwrap();

        let loaded = MediaSettings::load(path).unwrap();
        assert_eq!(loaded.max_file_size, 42);
        assert_eq!(loaded.image_sizes.len(), settings.image_sizes.len());
    }
}
