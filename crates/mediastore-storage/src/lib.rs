//! Mediastore Storage Library
//!
//! Storage abstraction and backends for the media engine. Includes the
//! Storage trait plus local filesystem and S3 implementations.
//!
//! # Storage key format
//!
//! Keys are forward-slash paths relative to the storage root:
//!
//! - **Originals**: `media/{date_prefix}/{filename}` (date prefix optional)
//! - **Thumbnails**: alongside the original, with `-{size_name}` appended
//! - **Chunk temp files**: `uploads/chunked/{session_id}/chunk_{index}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use mediastore_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
