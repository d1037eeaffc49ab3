//! Upload pipeline
//!
//! Single-request ingestion: validate against the active settings, sanitize
//! the filename, optimize oversized images, then commit through the catalog.
//! Thumbnail generation runs in the background so the upload response never
//! waits on rendering. Remote files can be pulled in by URL and flow through
//! the same pipeline.

use std::sync::Arc;

use mediastore_core::models::{sanitize_filename, UploadOptions};
use mediastore_core::{AppError, AppResult, MediaSettings};
use mediastore_processing::Thumbnailer;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::{IngestOutcome, IngestRequest, MediaCatalog};
use crate::thumbnails::ThumbnailService;

/// Upload ingestion service
#[derive(Clone)]
pub struct UploadService {
    catalog: MediaCatalog,
    thumbnails: ThumbnailService,
    settings: Arc<RwLock<MediaSettings>>,
}

impl UploadService {
    pub fn new(
        catalog: MediaCatalog,
        thumbnails: ThumbnailService,
        settings: Arc<RwLock<MediaSettings>>,
    ) -> Self {
        Self {
            catalog,
            thumbnails,
            settings,
        }
    }

    pub(crate) fn catalog(&self) -> &MediaCatalog {
        &self.catalog
    }

    /// Ingest one file.
    ///
    /// `content_type` may be omitted; it is then derived from the filename
    /// extension. Duplicate content resolves to the existing item and skips
    /// the thumbnail pass.
    #[tracing::instrument(skip(self, data, options), fields(filename = %filename, size = data.len()))]
    pub async fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        mut data: Vec<u8>,
        options: UploadOptions,
    ) -> AppResult<IngestOutcome> {
        let settings = self.settings.read().await.clone();

        if data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }
        if data.len() as u64 > settings.max_file_size {
            return Err(AppError::PayloadTooLarge {
                size: data.len() as u64,
                max: settings.max_file_size,
            });
        }
        if filename.len() > settings.max_filename_length {
            return Err(AppError::InvalidInput(format!(
                "Filename exceeds {} characters",
                settings.max_filename_length
            )));
        }

        let extension = file_extension(filename);
        if !settings.is_extension_allowed(extension) {
            return Err(AppError::InvalidInput(format!(
                "File extension not allowed: {}",
                extension
            )));
        }

        let mime_type = match content_type {
            Some(ct) if ct != "application/octet-stream" => ct.to_string(),
            _ => mime_for_extension(extension).to_string(),
        };
        if !settings.is_mime_type_allowed(&mime_type) {
            return Err(AppError::InvalidInput(format!(
                "Content type not allowed: {}",
                mime_type
            )));
        }

        let stored_name = if settings.slugify_filenames {
            sanitize_filename(filename)
        } else {
            filename.to_string()
        };

        let is_image = mime_type.starts_with("image/");
        let mut dimensions = None;

        if is_image {
            if options.optimize && settings.auto_optimize {
                match Thumbnailer::optimize(
                    &data,
                    &mime_type,
                    settings.max_image_width,
                    settings.max_image_height,
                    settings.jpeg_quality,
                ) {
                    Ok(Some(optimized)) => {
                        tracing::debug!(
                            before = data.len(),
                            after = optimized.len(),
                            "Image optimized"
                        );
                        data = optimized;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // Undecodable bytes with an image mime type still get
                        // stored as-is
                        tracing::warn!(error = %e, "Image optimization skipped");
                    }
                }
            }
            dimensions = Thumbnailer::dimensions(&data).ok();
        }

        let outcome = self
            .catalog
            .ingest(IngestRequest {
                filename: stored_name,
                mime_type,
                data,
                folder_id: options.folder_id,
                uploaded_by: options.uploaded_by,
                title: options.title,
                description: options.description,
                alt_text: options.alt_text,
                tags: options.tags,
                dimensions,
                deduplicate: settings.deduplicate,
                date_format: settings.organize_by_date.then(|| settings.date_format.clone()),
            })
            .await?;

        if !outcome.deduplicated
            && is_image
            && options.generate_thumbnails
            && settings.generate_thumbnails
        {
            let thumbnails = self.thumbnails.clone();
            let media_id = outcome.item.id;
            tokio::spawn(async move {
                if let Err(e) = thumbnails.generate_for_item(media_id).await {
                    tracing::warn!(media_id = %media_id, error = %e, "Background thumbnail generation failed");
                }
            });
        }

        Ok(outcome)
    }

    /// Fetch a remote file and ingest it through the normal pipeline.
    ///
    /// The filename comes from the caller, the Content-Disposition header,
    /// or the last URL path segment, in that order.
    #[tracing::instrument(skip(self, options), fields(url = %url))]
    pub async fn upload_from_url(
        &self,
        url: &str,
        filename: Option<&str>,
        options: UploadOptions,
    ) -> AppResult<IngestOutcome> {
        let response = reqwest::get(url)
            .await
            .map_err(|e| AppError::Network(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "Remote returned HTTP {} for {}",
                response.status(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let resolved_name = filename
            .map(str::to_string)
            .or_else(|| filename_from_disposition(response.headers()))
            .or_else(|| filename_from_url(url))
            .unwrap_or_else(|| format!("download-{}", Uuid::new_v4().simple()));

        let data = response
            .bytes()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read response body: {}", e)))?
            .to_vec();

        tracing::info!(size = data.len(), filename = %resolved_name, "Remote file fetched");

        self.upload(&resolved_name, content_type.as_deref(), data, options)
            .await
    }
}

fn filename_from_disposition(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split("filename=").nth(1))
        .map(|v| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

fn filename_from_url(url: &str) -> Option<String> {
    url.split('/')
        .next_back()
        .map(|s| s.split('?').next().unwrap_or(s))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn file_extension(filename: &str) -> &str {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

/// Content type derived from a filename extension. Unknown extensions fall
/// back to the generic binary type.
pub(crate) fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("JPG"), "image/jpeg");
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("xyz"), "application/octet-stream");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.JPG"), "JPG");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("noext"), "");
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://cdn.example.com/images/photo.png"),
            Some("photo.png".to_string())
        );
        assert_eq!(
            filename_from_url("https://cdn.example.com/photo.png?w=300&h=200"),
            Some("photo.png".to_string())
        );
        assert_eq!(filename_from_url("https://cdn.example.com/"), None);
    }

    #[test]
    fn test_filename_from_disposition() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_DISPOSITION,
            "attachment; filename=\"report.pdf\"".parse().unwrap(),
        );
        assert_eq!(
            filename_from_disposition(&headers),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition(&reqwest::header::HeaderMap::new()),
            None
        );
    }
}
