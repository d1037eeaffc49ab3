//! Mediastore Services Layer
//!
//! The business service layer: ingestion, deduplication, the chunked upload
//! state machine, folder hierarchy maintenance, the thumbnail pipeline, and
//! the background cleanup sweep. The `MediaEngine` composition root wires
//! everything together and re-exports a unified API so embedders depend on a
//! single facade.

pub mod catalog;
pub mod chunked;
pub mod cleanup;
pub mod engine;
pub mod folders;
pub mod telemetry;
pub mod thumbnails;
pub mod upload;

pub use catalog::{IngestOutcome, IngestRequest, MediaCatalog, UpdateMediaRequest};
pub use chunked::ChunkedUploadTracker;
pub use cleanup::CleanupService;
pub use engine::MediaEngine;
pub use folders::{DeleteMode, FolderManager};
pub use mediastore_core::{AppError, AppResult, ContentHash, MediaSettings, StorageBackend};
pub use mediastore_storage::{create_storage, Storage, StorageError, StorageResult};
pub use telemetry::init_telemetry;
pub use thumbnails::{ThumbnailReport, ThumbnailService};
pub use upload::UploadService;
