//! Media catalog
//!
//! The record of ingested items, their metadata, tag associations, and the
//! soft-delete lifecycle. One shared `CatalogState` holds items, folders, the
//! content-hash index, and tags behind a single RwLock so an item mutation
//! and its folder-stat adjustment commit together. The lock guards metadata
//! only; storage I/O always happens outside it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mediastore_core::models::{
    Folder, ImageDimensions, LibraryStats, MediaFilter, MediaItem, MediaListResponse, MediaType,
    Tag,
};
use mediastore_core::{AppError, AppResult, ContentHash};
use mediastore_storage::{keys, Storage};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared metadata state for the catalog, folder manager, and thumbnail
/// pipeline.
#[derive(Default)]
pub struct CatalogState {
    pub(crate) items: HashMap<Uuid, MediaItem>,
    pub(crate) hash_index: HashMap<ContentHash, Uuid>,
    pub(crate) folders: HashMap<Uuid, Folder>,
    pub(crate) tags: HashMap<String, Tag>,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything needed to commit one upload into the catalog
pub struct IngestRequest {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub folder_id: Option<Uuid>,
    pub uploaded_by: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub tags: Vec<String>,
    pub dimensions: Option<ImageDimensions>,
    pub deduplicate: bool,
    /// strftime prefix for date-organized keys, None = flat layout
    pub date_format: Option<String>,
}

/// Result of an ingest: either a fresh item or the pre-existing duplicate
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub item: MediaItem,
    pub deduplicated: bool,
}

/// Metadata-only edit of an item
#[derive(Debug, Clone, Default)]
pub struct UpdateMediaRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub alt_text: Option<String>,
}

/// Media catalog service
#[derive(Clone)]
pub struct MediaCatalog {
    state: Arc<RwLock<CatalogState>>,
    storage: Arc<dyn Storage>,
}

impl MediaCatalog {
    pub fn new(state: Arc<RwLock<CatalogState>>, storage: Arc<dyn Storage>) -> Self {
        Self { state, storage }
    }

    /// Ingest a file into the catalog.
    ///
    /// Content is hashed first; with dedup enabled a matching hash resolves
    /// to the existing item instead of creating a second row. Two concurrent
    /// ingests of identical content race on the hash index under the write
    /// lock: exactly one row wins, the loser deletes its own bytes and
    /// returns the winner.
    #[tracing::instrument(skip(self, request), fields(filename = %request.filename, size = request.data.len()))]
    pub async fn ingest(&self, request: IngestRequest) -> AppResult<IngestOutcome> {
        let content_hash = ContentHash::digest(&request.data);

        // Cheap pre-check before paying for the storage write
        if request.deduplicate {
            let state = self.state.read().await;
            if let Some(existing) = lookup_by_hash(&state, &content_hash) {
                tracing::info!(
                    media_id = %existing.id,
                    content_hash = %content_hash,
                    "Duplicate content resolved to existing item"
                );
                return Ok(IngestOutcome {
                    item: existing,
                    deduplicated: true,
                });
            }
        }

        {
            let state = self.state.read().await;
            if let Some(folder_id) = request.folder_id {
                if !state.folders.contains_key(&folder_id) {
                    return Err(AppError::NotFound(format!("Folder not found: {}", folder_id)));
                }
            }
        }

        let size = request.data.len() as u64;
        let key = keys::media_key(&request.filename, request.date_format.as_deref(), Utc::now());
        let url = self
            .storage
            .upload(&key, &request.mime_type, request.data)
            .await?;

        let mut state = self.state.write().await;

        // Dedup race: another ingest may have committed the same hash while
        // our bytes were being written
        if request.deduplicate {
            if let Some(existing) = lookup_by_hash(&state, &content_hash) {
                drop(state);
                if let Err(e) = self.storage.delete(&key).await {
                    tracing::warn!(error = %e, key = %key, "Failed to remove losing duplicate bytes");
                }
                return Ok(IngestOutcome {
                    item: existing,
                    deduplicated: true,
                });
            }
        }

        // Folder may have vanished while we were writing bytes
        if let Some(folder_id) = request.folder_id {
            if !state.folders.contains_key(&folder_id) {
                drop(state);
                let _ = self.storage.delete(&key).await;
                return Err(AppError::NotFound(format!("Folder not found: {}", folder_id)));
            }
        }

        let mut item = MediaItem::new(
            request.filename,
            request.mime_type,
            size,
            key,
            content_hash.clone(),
        );
        item.url = url;
        item.folder_id = request.folder_id;
        item.uploaded_by = request.uploaded_by;
        item.title = request.title;
        item.description = request.description;
        item.alt_text = request.alt_text;
        item.dimensions = request.dimensions;

        for tag_name in &request.tags {
            let tag_name = tag_name.trim();
            if tag_name.is_empty() {
                continue;
            }
            item.tags.push(tag_name.to_string());
            increment_tag(&mut state.tags, tag_name);
        }

        if let Some(folder_id) = item.folder_id {
            if let Some(folder) = state.folders.get_mut(&folder_id) {
                attach_stats(folder, item.size);
            }
        }

        state.hash_index.insert(content_hash, item.id);
        state.items.insert(item.id, item.clone());

        tracing::info!(media_id = %item.id, path = %item.path, "Media item ingested");

        Ok(IngestOutcome {
            item,
            deduplicated: false,
        })
    }

    /// Get an item by id
    pub async fn get(&self, id: Uuid) -> AppResult<MediaItem> {
        let state = self.state.read().await;
        state
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", id)))
    }

    /// Get an item by its storage key
    pub async fn get_by_path(&self, path: &str) -> AppResult<MediaItem> {
        let state = self.state.read().await;
        state
            .items
            .values()
            .find(|m| m.path == path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Media item not found at path: {}", path)))
    }

    /// Bump an item's usage counter
    pub async fn increment_usage(&self, id: Uuid) -> AppResult<MediaItem> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", id)))?;

        item.usage_count += 1;
        Ok(item.clone())
    }

    /// Most recently uploaded non-deleted items
    pub async fn recent(&self, limit: usize) -> Vec<MediaItem> {
        let state = self.state.read().await;

        let mut items: Vec<&MediaItem> = state.items.values().filter(|m| !m.is_deleted()).collect();
        items.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

        items.into_iter().take(limit).cloned().collect()
    }

    /// Update item metadata fields
    pub async fn update_metadata(
        &self,
        id: Uuid,
        update: UpdateMediaRequest,
    ) -> AppResult<MediaItem> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", id)))?;

        if let Some(title) = update.title {
            item.title = Some(title);
        }
        if let Some(description) = update.description {
            item.description = Some(description);
        }
        if let Some(alt_text) = update.alt_text {
            item.alt_text = Some(alt_text);
        }
        item.updated_at = Utc::now();

        Ok(item.clone())
    }

    /// Attach a tag to an item, adjusting the tag's usage count
    pub async fn add_tag(&self, id: Uuid, tag_name: &str) -> AppResult<MediaItem> {
        let tag_name = tag_name.trim();
        if tag_name.is_empty() {
            return Err(AppError::InvalidInput("Tag name must not be empty".to_string()));
        }

        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", id)))?;

        if item.tags.iter().any(|t| t == tag_name) {
            return Ok(item.clone());
        }

        item.tags.push(tag_name.to_string());
        item.updated_at = Utc::now();
        let snapshot = item.clone();
        increment_tag(&mut state.tags, tag_name);

        Ok(snapshot)
    }

    /// Detach a tag from an item, adjusting the tag's usage count
    pub async fn remove_tag(&self, id: Uuid, tag_name: &str) -> AppResult<MediaItem> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", id)))?;

        let before = item.tags.len();
        item.tags.retain(|t| t != tag_name);
        if item.tags.len() == before {
            return Ok(item.clone());
        }

        item.updated_at = Utc::now();
        let snapshot = item.clone();
        decrement_tag(&mut state.tags, tag_name);

        Ok(snapshot)
    }

    /// All known tags with usage counts
    pub async fn tags(&self) -> Vec<Tag> {
        let state = self.state.read().await;
        let mut tags: Vec<Tag> = state.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.slug.cmp(&b.slug));
        tags
    }

    /// Soft-delete an item. Bytes, folder stats, and the hash-index entry
    /// remain until a hard delete. Already-deleted items are left as is.
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<MediaItem> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", id)))?;

        if item.deleted_at.is_none() {
            item.deleted_at = Some(Utc::now());
            item.updated_at = Utc::now();
            tracing::info!(media_id = %id, "Media item soft-deleted");
        }

        Ok(item.clone())
    }

    /// Clear an item's soft-delete marker
    pub async fn restore(&self, id: Uuid) -> AppResult<MediaItem> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", id)))?;

        if item.deleted_at.is_some() {
            item.deleted_at = None;
            item.updated_at = Utc::now();
            tracing::info!(media_id = %id, "Media item restored");
        }

        Ok(item.clone())
    }

    /// Hard-delete an item: bytes and thumbnail artifacts first, the catalog
    /// row last. A crash mid-sequence leaves the row in place so a retry can
    /// resume; it never orphans bytes undetectably.
    #[tracing::instrument(skip(self), fields(media_id = %id))]
    pub async fn hard_delete(&self, id: Uuid) -> AppResult<()> {
        let item = self.get(id).await?;

        for thumb in &item.thumbnails {
            if let Err(e) = self.storage.delete(&thumb.path).await {
                tracing::warn!(error = %e, path = %thumb.path, "Failed to delete thumbnail artifact");
            }
        }
        self.storage.delete(&item.path).await?;

        let mut state = self.state.write().await;
        let Some(item) = state.items.remove(&id) else {
            // Concurrent hard delete already removed the row
            return Ok(());
        };

        if state.hash_index.get(&item.content_hash) == Some(&id) {
            state.hash_index.remove(&item.content_hash);
        }

        if let Some(folder_id) = item.folder_id {
            if let Some(folder) = state.folders.get_mut(&folder_id) {
                detach_stats(folder, item.size);
            }
        }

        for tag_name in &item.tags {
            decrement_tag(&mut state.tags, tag_name);
        }

        tracing::info!(media_id = %id, path = %item.path, "Media item hard-deleted");

        Ok(())
    }

    /// Move an item between folders.
    ///
    /// Both folders' stats and the item's folder reference change under one
    /// write-lock hold, so no reader observes a half-applied move.
    pub async fn move_to_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<MediaItem> {
        let mut state = self.state.write().await;

        if let Some(target) = folder_id {
            if !state.folders.contains_key(&target) {
                return Err(AppError::NotFound(format!("Folder not found: {}", target)));
            }
        }

        let item = state
            .items
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Media item not found: {}", id)))?;
        let previous = item.folder_id;
        let size = item.size;

        if previous == folder_id {
            return Ok(item.clone());
        }

        if let Some(old_id) = previous {
            if let Some(folder) = state.folders.get_mut(&old_id) {
                detach_stats(folder, size);
            }
        }
        if let Some(new_id) = folder_id {
            if let Some(folder) = state.folders.get_mut(&new_id) {
                attach_stats(folder, size);
            }
        }

        let item = state.items.get_mut(&id).expect("item checked above");
        item.folder_id = folder_id;
        item.updated_at = Utc::now();

        Ok(item.clone())
    }

    /// List items with filtering, sorting, and pagination
    pub async fn list(&self, filter: MediaFilter) -> MediaListResponse {
        let state = self.state.read().await;

        let mut filtered: Vec<&MediaItem> = state
            .items
            .values()
            .filter(|m| {
                if !filter.include_deleted && m.is_deleted() {
                    return false;
                }

                if let Some(media_type) = filter.media_type {
                    if m.media_type != media_type {
                        return false;
                    }
                }

                if let Some(folder_id) = filter.folder_id {
                    if m.folder_id != Some(folder_id) {
                        return false;
                    }
                }

                if let Some(ref search) = filter.search {
                    let needle = search.to_lowercase();
                    let matches = m.filename.to_lowercase().contains(&needle)
                        || m.title
                            .as_ref()
                            .map(|t| t.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                        || m.description
                            .as_ref()
                            .map(|d| d.to_lowercase().contains(&needle))
                            .unwrap_or(false);
                    if !matches {
                        return false;
                    }
                }

                if let Some(ref tags) = filter.tags {
                    if !tags.iter().any(|t| m.tags.contains(t)) {
                        return false;
                    }
                }

                if let Some(date_from) = filter.date_from {
                    if m.uploaded_at < date_from {
                        return false;
                    }
                }
                if let Some(date_to) = filter.date_to {
                    if m.uploaded_at > date_to {
                        return false;
                    }
                }

                if let Some(min_size) = filter.min_size {
                    if m.size < min_size {
                        return false;
                    }
                }
                if let Some(max_size) = filter.max_size {
                    if m.size > max_size {
                        return false;
                    }
                }

                true
            })
            .collect();

        let total = filtered.len() as u64;

        let sort_by = filter.sort_by.as_deref().unwrap_or("uploaded_at");
        let sort_order = filter.sort_order.as_deref().unwrap_or("desc");

        filtered.sort_by(|a, b| {
            let cmp = match sort_by {
                "filename" => a.filename.cmp(&b.filename),
                "size" => a.size.cmp(&b.size),
                _ => a.uploaded_at.cmp(&b.uploaded_at),
            };
            if sort_order == "asc" {
                cmp
            } else {
                cmp.reverse()
            }
        });

        let page = filter.page.unwrap_or(1).max(1);
        let per_page = filter.per_page.unwrap_or(20).clamp(1, 100);
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as u32;

        let items: Vec<MediaItem> = filtered
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .cloned()
            .collect();

        MediaListResponse {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }

    /// Search items by filename, title, or tag
    pub async fn search(&self, query: &str, limit: usize) -> Vec<MediaItem> {
        let state = self.state.read().await;
        let needle = query.to_lowercase();

        state
            .items
            .values()
            .filter(|m| {
                !m.is_deleted()
                    && (m.filename.to_lowercase().contains(&needle)
                        || m.title
                            .as_ref()
                            .map(|t| t.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                        || m.tags.iter().any(|t| t.to_lowercase().contains(&needle)))
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Library-wide counts over non-deleted items
    pub async fn stats(&self) -> LibraryStats {
        let state = self.state.read().await;
        let mut stats = LibraryStats::default();

        for item in state.items.values() {
            if item.is_deleted() {
                continue;
            }

            stats.total_items += 1;
            stats.total_size += item.size;

            match item.media_type {
                MediaType::Image => stats.image_count += 1,
                MediaType::Video => stats.video_count += 1,
                MediaType::Audio => stats.audio_count += 1,
                MediaType::Document => stats.document_count += 1,
                _ => stats.other_count += 1,
            }
        }

        stats
    }
}

fn lookup_by_hash(state: &CatalogState, hash: &ContentHash) -> Option<MediaItem> {
    state
        .hash_index
        .get(hash)
        .and_then(|id| state.items.get(id))
        .cloned()
}

pub(crate) fn attach_stats(folder: &mut Folder, size: u64) {
    folder.item_count += 1;
    folder.total_size += size;
    folder.updated_at = Utc::now();
}

pub(crate) fn detach_stats(folder: &mut Folder, size: u64) {
    folder.item_count = folder.item_count.saturating_sub(1);
    folder.total_size = folder.total_size.saturating_sub(size);
    folder.updated_at = Utc::now();
}

fn increment_tag(tags: &mut HashMap<String, Tag>, name: &str) {
    let tag = tags
        .entry(mediastore_core::models::slugify(name))
        .or_insert_with(|| Tag::new(name));
    tag.usage_count += 1;
}

fn decrement_tag(tags: &mut HashMap<String, Tag>, name: &str) {
    let slug = mediastore_core::models::slugify(name);
    if let Some(tag) = tags.get_mut(&slug) {
        tag.usage_count = tag.usage_count.saturating_sub(1);
    }
}
