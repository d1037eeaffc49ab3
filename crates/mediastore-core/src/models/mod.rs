//! Domain models shared across mediastore components.

pub mod folder;
pub mod image;
pub mod media;
pub mod storage;
pub mod tag;
pub mod upload;

pub use folder::{
    CreateFolderRequest, Folder, FolderBreadcrumb, FolderTreeNode, UpdateFolderRequest,
};
pub use image::{ImageDimensions, ImageFormat, ImageSize, ResizeMode};
pub use media::{
    format_bytes, sanitize_filename, slugify, LibraryStats, MediaFilter, MediaItem,
    MediaListResponse, MediaType, Thumbnail, UploadOptions,
};
pub use storage::StorageBackend;
pub use tag::Tag;
pub use upload::{
    expected_chunk_size, ChunkState, ChunkedUpload, InitChunkedUploadRequest, UploadState,
};
