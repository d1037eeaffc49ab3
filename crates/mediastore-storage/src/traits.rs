//! Storage abstraction trait
//!
//! All storage backends (local filesystem, S3) implement this trait so the
//! catalog and upload services never couple to a specific backend.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use mediastore_core::{AppError, StorageBackend};
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => {
                AppError::NotFound(format!("Stored object not found: {}", key))
            }
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked byte stream returned by `download_stream`
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// Callers compute keys through the `keys` module; backends treat keys as
/// opaque relative paths. Writes are atomic per key: a reader never observes
/// a half-written object.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a storage key, returning the public URL.
    ///
    /// Overwrites any existing object under the same key.
    async fn upload(&self, key: &str, content_type: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Download an object's full content by key
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Download an object as a stream of byte chunks (for large files)
    async fn download_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check whether an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Size in bytes of an object, if it exists
    async fn content_length(&self, key: &str) -> StorageResult<u64>;

    /// Public URL for a storage key
    fn url_for(&self, key: &str) -> String;

    /// Probe the backend, returning a short status message on success
    async fn health_check(&self) -> StorageResult<String>;

    /// Backend type of this implementation
    fn backend_type(&self) -> StorageBackend;
}
