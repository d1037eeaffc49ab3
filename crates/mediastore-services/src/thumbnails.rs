//! Thumbnail variant lifecycle
//!
//! Renders the enabled size presets for an image item, stores the variants
//! next to the original, and records them on the catalog row. Presets render
//! independently, so one bad preset never blocks the others.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use mediastore_core::models::{ImageSize, MediaItem, Thumbnail};
use mediastore_core::{AppError, AppResult, MediaSettings};
use mediastore_processing::Thumbnailer;
use mediastore_storage::{keys, Storage};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::CatalogState;

/// Outcome of one generation run over an item's presets
#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbnailReport {
    pub generated: usize,
    pub failed: usize,
    /// Presets skipped because they would only upscale the source
    pub skipped: usize,
}

impl ThumbnailReport {
    /// Collapse into a result: any failure among attempted presets is
    /// reported as a partial failure.
    pub fn into_result(self) -> AppResult<Self> {
        if self.failed == 0 {
            Ok(self)
        } else {
            Err(AppError::PartialFailure {
                failed: self.failed,
                total: self.generated + self.failed,
            })
        }
    }
}

/// Thumbnail pipeline service
#[derive(Clone)]
pub struct ThumbnailService {
    state: Arc<RwLock<CatalogState>>,
    storage: Arc<dyn Storage>,
    settings: Arc<RwLock<MediaSettings>>,
}

impl ThumbnailService {
    pub fn new(
        state: Arc<RwLock<CatalogState>>,
        storage: Arc<dyn Storage>,
        settings: Arc<RwLock<MediaSettings>>,
    ) -> Self {
        Self {
            state,
            storage,
            settings,
        }
    }

    /// Render and store all enabled presets for an image item.
    ///
    /// Non-image items are a no-op. Variants replace any prior variant of
    /// the same preset name; stale artifacts are removed afterwards.
    #[tracing::instrument(skip(self), fields(media_id = %media_id))]
    pub async fn generate_for_item(&self, media_id: Uuid) -> AppResult<ThumbnailReport> {
        let item = {
            let state = self.state.read().await;
            state
                .items
                .get(&media_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", media_id)))?
        };

        if !item.is_image() {
            return Ok(ThumbnailReport::default());
        }

        let sizes: Vec<ImageSize> = {
            let settings = self.settings.read().await;
            settings.enabled_sizes().into_iter().cloned().collect()
        };
        if sizes.is_empty() {
            return Ok(ThumbnailReport::default());
        }

        let data = self.storage.download(&item.path).await?;
        let img = Thumbnailer::decode(&data)?;
        let format = Thumbnailer::variant_format(&item.mime_type);
        let (source_width, source_height) = (img.width(), img.height());

        let mut report = ThumbnailReport::default();
        let mut renders = Vec::new();

        for size in &sizes {
            if Thumbnailer::would_upscale(size, source_width, source_height) {
                tracing::debug!(size_name = %size.name, "Skipping preset, source too small");
                report.skipped += 1;
                continue;
            }
            renders.push(size);
        }

        let uploads = renders.into_iter().map(|size| {
            let storage = self.storage.clone();
            let img = &img;
            let original_key = item.path.clone();
            async move {
                let variant = Thumbnailer::render(img, size, format)?;
                let key = keys::thumbnail_key(&original_key, &variant.size_name, format.extension());
                let byte_count = variant.data.len() as u64;
                let url = storage
                    .upload(&key, format.mime_type(), variant.data)
                    .await?;

                Ok::<Thumbnail, AppError>(Thumbnail {
                    size_name: variant.size_name,
                    width: variant.width,
                    height: variant.height,
                    path: key,
                    url,
                    size: byte_count,
                    created_at: Utc::now(),
                })
            }
        });

        let mut fresh = Vec::new();
        for result in join_all(uploads).await {
            match result {
                Ok(thumb) => {
                    report.generated += 1;
                    fresh.push(thumb);
                }
                Err(e) => {
                    tracing::warn!(media_id = %media_id, error = %e, "Thumbnail preset failed");
                    report.failed += 1;
                }
            }
        }

        let stale = {
            let mut state = self.state.write().await;
            let Some(item) = state.items.get_mut(&media_id) else {
                // Item deleted while we rendered; don't leave orphan artifacts
                drop(state);
                for thumb in &fresh {
                    let _ = self.storage.delete(&thumb.path).await;
                }
                return Err(AppError::NotFound(format!("Media item not found: {}", media_id)));
            };

            let fresh_names: Vec<&str> = fresh.iter().map(|t| t.size_name.as_str()).collect();
            let stale: Vec<String> = item
                .thumbnails
                .iter()
                .filter(|t| {
                    fresh_names.contains(&t.size_name.as_str())
                        && !fresh.iter().any(|f| f.path == t.path)
                })
                .map(|t| t.path.clone())
                .collect();

            item.thumbnails.retain(|t| !fresh_names.contains(&t.size_name.as_str()));
            item.thumbnails.extend(fresh.iter().cloned());
            item.thumbnails.sort_by(|a, b| a.size_name.cmp(&b.size_name));
            item.updated_at = Utc::now();
            stale
        };

        for path in stale {
            if let Err(e) = self.storage.delete(&path).await {
                tracing::warn!(path = %path, error = %e, "Failed to delete stale thumbnail");
            }
        }

        tracing::info!(
            media_id = %media_id,
            generated = report.generated,
            failed = report.failed,
            skipped = report.skipped,
            "Thumbnail generation finished"
        );

        Ok(report)
    }

    /// Regenerate thumbnails for every image item. Returns the number of
    /// items that regenerated cleanly.
    pub async fn regenerate_all(&self) -> usize {
        let image_ids: Vec<Uuid> = {
            let state = self.state.read().await;
            state
                .items
                .values()
                .filter(|m| m.is_image() && !m.is_deleted())
                .map(|m| m.id)
                .collect()
        };

        let mut ok = 0;
        for id in image_ids {
            match self.generate_for_item(id).await.map(ThumbnailReport::into_result) {
                Ok(Ok(_)) => ok += 1,
                Ok(Err(e)) | Err(e) => {
                    tracing::warn!(media_id = %id, error = %e, "Thumbnail regeneration failed");
                }
            }
        }
        ok
    }

    /// Remove every stored thumbnail variant and its catalog record.
    /// Returns the number of artifacts deleted.
    pub async fn clear_cache(&self) -> AppResult<usize> {
        let paths: Vec<String> = {
            let state = self.state.read().await;
            state
                .items
                .values()
                .flat_map(|m| m.thumbnails.iter().map(|t| t.path.clone()))
                .collect()
        };

        let mut deleted = 0;
        for path in &paths {
            match self.storage.delete(path).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to delete thumbnail artifact")
                }
            }
        }

        let mut state = self.state.write().await;
        for item in state.items.values_mut() {
            if !item.thumbnails.is_empty() {
                item.thumbnails.clear();
                item.updated_at = Utc::now();
            }
        }

        tracing::info!(deleted = deleted, "Thumbnail cache cleared");
        Ok(deleted)
    }

    /// Snapshot of an item's current thumbnails
    pub async fn list_for_item(&self, media_id: Uuid) -> AppResult<Vec<Thumbnail>> {
        let state = self.state.read().await;
        state
            .items
            .get(&media_id)
            .map(|m: &MediaItem| m.thumbnails.clone())
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", media_id)))
    }
}
