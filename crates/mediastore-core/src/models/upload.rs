//! Chunked upload models
//!
//! Session state for multi-request uploads. Each session tracks per-chunk
//! receipt so chunks can arrive out of order and retransmits stay idempotent.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::hash::ContentHash;

/// Lifecycle state of a chunked upload session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    /// Session created, no chunks received yet
    Initialized,
    /// At least one chunk received
    Receiving,
    /// All chunks present, assembly in progress
    Assembling,
    /// Assembled and ingested into the catalog
    Completed,
    /// Cancelled by the client
    Cancelled,
    /// Deadline passed before completion
    Expired,
}

impl UploadState {
    /// Terminal states accept no further chunk traffic.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

/// Receipt record for a single chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkState {
    pub index: u32,
    /// Exact byte length this chunk must carry
    pub expected_size: u64,
    pub received: bool,
    /// Digest of the chunk bytes as last received
    pub checksum: Option<ContentHash>,
    pub received_at: Option<DateTime<Utc>>,
    /// A byte write for this chunk is in flight; serializes same-index traffic
    #[serde(skip)]
    pub pending: bool,
}

/// A chunked upload session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkedUpload {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub total_size: u64,
    pub chunk_size: u64,
    pub total_chunks: u32,
    /// Count of distinct chunks received so far
    pub received_chunks: u32,
    pub chunks: Vec<ChunkState>,
    pub folder_id: Option<Uuid>,
    pub uploaded_by: Option<Uuid>,
    /// Storage key prefix holding the per-chunk temp files
    pub temp_prefix: String,
    pub state: UploadState,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Catalog item produced by a successful completion
    pub media_id: Option<Uuid>,
}

impl ChunkedUpload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        total_size: u64,
        chunk_size: u64,
        total_chunks: u32,
        expiry_hours: i64,
    ) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let chunks = (0..total_chunks)
            .map(|index| ChunkState {
                index,
                expected_size: expected_chunk_size(total_size, chunk_size, total_chunks, index),
                received: false,
                checksum: None,
                received_at: None,
                pending: false,
            })
            .collect();

        Self {
            id,
            filename: filename.into(),
            content_type: content_type.into(),
            total_size,
            chunk_size,
            total_chunks,
            received_chunks: 0,
            chunks,
            folder_id: None,
            uploaded_by: None,
            temp_prefix: format!("uploads/chunked/{}", id),
            state: UploadState::Initialized,
            started_at: now,
            expires_at: now + Duration::hours(expiry_hours),
            completed_at: None,
            media_id: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.received_chunks == self.total_chunks
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Storage key for one chunk's temp file
    pub fn chunk_key(&self, index: u32) -> String {
        format!("{}/chunk_{}", self.temp_prefix, index)
    }

    /// Completion progress in [0.0, 100.0]
    pub fn progress(&self) -> f64 {
        if self.total_chunks == 0 {
            return 0.0;
        }
        (self.received_chunks as f64 / self.total_chunks as f64) * 100.0
    }
}

/// Exact byte length of chunk `index`. Every chunk is `chunk_size` except the
/// last, which carries the remainder.
pub fn expected_chunk_size(total_size: u64, chunk_size: u64, total_chunks: u32, index: u32) -> u64 {
    if index + 1 == total_chunks {
        total_size - chunk_size * (total_chunks as u64 - 1)
    } else {
        chunk_size
    }
}

/// Request DTO to open a chunked upload session
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InitChunkedUploadRequest {
    #[validate(length(min = 1, max = 255, message = "Filename must not be empty"))]
    pub filename: String,
    #[validate(length(min = 1, message = "Content type must not be empty"))]
    pub content_type: String,
    #[validate(range(min = 1, message = "Total size must be positive"))]
    pub total_size: u64,
    #[validate(range(min = 1, message = "Chunk size must be positive"))]
    pub chunk_size: u64,
    #[validate(range(min = 1, message = "Total chunks must be positive"))]
    pub total_chunks: u32,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    #[serde(default)]
    pub uploaded_by: Option<Uuid>,
}
