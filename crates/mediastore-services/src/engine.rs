//! Engine composition root
//!
//! Builds the storage backend from settings and wires every service around
//! one shared catalog state. Embedders construct a `MediaEngine` and reach
//! the services through its accessors.

use std::sync::Arc;

use mediastore_core::{AppError, AppResult, MediaSettings};
use mediastore_storage::{create_storage, Storage};
use tokio::sync::RwLock;

use crate::catalog::{CatalogState, MediaCatalog};
use crate::chunked::ChunkedUploadTracker;
use crate::cleanup::CleanupService;
use crate::folders::FolderManager;
use crate::thumbnails::ThumbnailService;
use crate::upload::UploadService;

/// The assembled media engine
pub struct MediaEngine {
    settings: Arc<RwLock<MediaSettings>>,
    storage: Arc<dyn Storage>,
    catalog: MediaCatalog,
    folders: FolderManager,
    thumbnails: ThumbnailService,
    uploads: UploadService,
    chunked: ChunkedUploadTracker,
    cleanup: Arc<CleanupService>,
}

impl MediaEngine {
    /// Build an engine from validated settings.
    pub async fn new(settings: MediaSettings) -> AppResult<Self> {
        settings.ensure_valid()?;

        let storage = create_storage(&settings).await?;
        Ok(Self::with_storage(settings, storage))
    }

    /// Build an engine around an existing storage backend.
    pub fn with_storage(settings: MediaSettings, storage: Arc<dyn Storage>) -> Self {
        let settings = Arc::new(RwLock::new(settings));
        let state = Arc::new(RwLock::new(CatalogState::new()));

        let catalog = MediaCatalog::new(state.clone(), storage.clone());
        let folders = FolderManager::new(state.clone(), catalog.clone());
        let thumbnails = ThumbnailService::new(state.clone(), storage.clone(), settings.clone());
        let uploads = UploadService::new(catalog.clone(), thumbnails.clone(), settings.clone());
        let chunked = ChunkedUploadTracker::new(
            state,
            storage.clone(),
            uploads.clone(),
            settings.clone(),
        );
        let cleanup = Arc::new(CleanupService::new(chunked.clone()));

        tracing::info!(backend = ?storage.backend_type(), "Media engine assembled");

        Self {
            settings,
            storage,
            catalog,
            folders,
            thumbnails,
            uploads,
            chunked,
            cleanup,
        }
    }

    pub fn catalog(&self) -> &MediaCatalog {
        &self.catalog
    }

    pub fn folders(&self) -> &FolderManager {
        &self.folders
    }

    pub fn thumbnails(&self) -> &ThumbnailService {
        &self.thumbnails
    }

    pub fn uploads(&self) -> &UploadService {
        &self.uploads
    }

    pub fn chunked(&self) -> &ChunkedUploadTracker {
        &self.chunked
    }

    /// Spawn the hourly session sweep; the handle aborts it on shutdown.
    pub fn start_cleanup(&self) -> tokio::task::JoinHandle<()> {
        self.cleanup.clone().start()
    }

    /// Snapshot of the active settings
    pub async fn settings(&self) -> MediaSettings {
        self.settings.read().await.clone()
    }

    /// Replace the active settings after validation.
    ///
    /// The storage backend is fixed at construction; switching backends
    /// requires a new engine.
    pub async fn update_settings(&self, settings: MediaSettings) -> AppResult<()> {
        settings.ensure_valid()?;

        let current = self.settings.read().await;
        if settings.storage_backend != current.storage_backend {
            return Err(AppError::InvalidInput(
                "Storage backend cannot change on a running engine".to_string(),
            ));
        }
        drop(current);

        *self.settings.write().await = settings;
        tracing::info!("Settings updated");
        Ok(())
    }

    /// Probe the storage backend
    pub async fn storage_health(&self) -> AppResult<String> {
        Ok(self.storage.health_check().await?)
    }
}
