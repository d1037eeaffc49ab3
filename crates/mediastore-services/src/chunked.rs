//! Chunked upload sessions
//!
//! Large files arrive as fixed-size chunks over multiple requests. Each
//! session is a small state machine: Initialized -> Receiving -> Assembling
//! -> Completed, with Cancelled and Expired as the other terminal states.
//! Chunks may arrive out of order and retransmits are idempotent. Assembly
//! re-runs the assembled bytes through the normal upload pipeline, so
//! validation, dedup, and thumbnails all apply.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mediastore_core::models::{
    expected_chunk_size, ChunkedUpload, InitChunkedUploadRequest, MediaItem, UploadOptions,
    UploadState,
};
use mediastore_core::{AppError, AppResult, ContentHash, MediaSettings};
use mediastore_storage::Storage;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;
use validator::Validate;

use crate::catalog::CatalogState;
use crate::upload::UploadService;

const CHUNK_CONTENT_TYPE: &str = "application/octet-stream";

/// Chunked upload session tracker
#[derive(Clone)]
pub struct ChunkedUploadTracker {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<ChunkedUpload>>>>>,
    state: Arc<RwLock<CatalogState>>,
    storage: Arc<dyn Storage>,
    uploads: UploadService,
    settings: Arc<RwLock<MediaSettings>>,
}

impl ChunkedUploadTracker {
    pub fn new(
        state: Arc<RwLock<CatalogState>>,
        storage: Arc<dyn Storage>,
        uploads: UploadService,
        settings: Arc<RwLock<MediaSettings>>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            state,
            storage,
            uploads,
            settings,
        }
    }

    /// Open a new session.
    ///
    /// The declared geometry must be consistent: every chunk is `chunk_size`
    /// bytes except the last, which carries the positive remainder.
    #[tracing::instrument(skip(self, request), fields(filename = %request.filename, total_size = request.total_size))]
    pub async fn init(&self, request: InitChunkedUploadRequest) -> AppResult<ChunkedUpload> {
        request.validate()?;

        let geometry_error = || {
            AppError::InvalidInput(format!(
                "Declared size {} does not fit {} chunks of {} bytes",
                request.total_size, request.total_chunks, request.chunk_size
            ))
        };
        let full_chunks = request
            .chunk_size
            .checked_mul(request.total_chunks as u64 - 1)
            .ok_or_else(geometry_error)?;
        let max_total = full_chunks
            .checked_add(request.chunk_size)
            .ok_or_else(geometry_error)?;
        if request.total_size <= full_chunks || request.total_size > max_total {
            return Err(geometry_error());
        }

        let settings = self.settings.read().await;
        if request.total_size > settings.max_file_size {
            return Err(AppError::PayloadTooLarge {
                size: request.total_size,
                max: settings.max_file_size,
            });
        }
        let extension = std::path::Path::new(&request.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if !settings.is_extension_allowed(extension) {
            return Err(AppError::InvalidInput(format!(
                "File extension not allowed: {}",
                extension
            )));
        }
        let expiry_hours = settings.chunk_expiry_hours;
        drop(settings);

        if let Some(folder_id) = request.folder_id {
            let state = self.state.read().await;
            if !state.folders.contains_key(&folder_id) {
                return Err(AppError::NotFound(format!("Folder not found: {}", folder_id)));
            }
        }

        let mut session = ChunkedUpload::new(
            request.filename,
            request.content_type,
            request.total_size,
            request.chunk_size,
            request.total_chunks,
            expiry_hours,
        );
        session.folder_id = request.folder_id;
        session.uploaded_by = request.uploaded_by;

        tracing::info!(
            upload_id = %session.id,
            total_chunks = session.total_chunks,
            "Chunked upload session opened"
        );

        let snapshot = session.clone();
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::new(Mutex::new(session)));

        Ok(snapshot)
    }

    /// Receive one chunk.
    ///
    /// Out-of-order arrival is fine. Re-sending an already-received chunk
    /// with identical bytes is a no-op; changed bytes overwrite the stored
    /// file and its checksum. Neither double-counts the chunk. At most one
    /// byte write per index is in flight at a time, so the recorded checksum
    /// always describes the bytes that actually landed in storage.
    #[tracing::instrument(skip(self, data), fields(upload_id = %id, chunk = index))]
    pub async fn receive_chunk(
        &self,
        id: Uuid,
        index: u32,
        data: Vec<u8>,
    ) -> AppResult<ChunkedUpload> {
        let session = self.session(id).await?;
        let checksum = ContentHash::digest(&data);

        let chunk_key = {
            let mut session = session.lock().await;
            self.check_active(&mut session)?;

            if index >= session.total_chunks {
                return Err(AppError::InvalidInput(format!(
                    "Chunk index {} out of range (total {})",
                    index, session.total_chunks
                )));
            }
            let expected = expected_chunk_size(
                session.total_size,
                session.chunk_size,
                session.total_chunks,
                index,
            );
            if data.len() as u64 != expected {
                return Err(AppError::InvalidInput(format!(
                    "Chunk {} must be {} bytes, got {}",
                    index,
                    expected,
                    data.len()
                )));
            }

            let chunk = &mut session.chunks[index as usize];
            if chunk.pending {
                return Err(AppError::Conflict(format!(
                    "Chunk {} is already being written",
                    index
                )));
            }
            if chunk.received && chunk.checksum.as_ref() == Some(&checksum) {
                // Identical retransmit; the stored bytes already match
                return Ok(session.clone());
            }
            chunk.pending = true;

            session.chunk_key(index)
        };

        // Bytes go to storage without holding the session lock; `pending`
        // keeps a second write for the same index from racing this one
        let uploaded = self
            .storage
            .upload(&chunk_key, CHUNK_CONTENT_TYPE, data)
            .await;

        let mut session = session.lock().await;
        session.chunks[index as usize].pending = false;
        if let Err(e) = uploaded {
            return Err(e.into());
        }

        if session.state.is_terminal() || session.state == UploadState::Assembling {
            // Session ended while the bytes were in flight
            let ended = session.state;
            drop(session);
            let _ = self.storage.delete(&chunk_key).await;
            return Err(match ended {
                UploadState::Expired => {
                    AppError::Expired(format!("Upload session expired: {}", id))
                }
                UploadState::Assembling => {
                    AppError::Conflict("Assembly in progress".to_string())
                }
                _ => AppError::NotFound(format!("Upload session not found: {}", id)),
            });
        }

        let first_receipt = {
            let chunk = &mut session.chunks[index as usize];
            let first = !chunk.received;
            chunk.received = true;
            chunk.checksum = Some(checksum);
            chunk.received_at = Some(Utc::now());
            first
        };
        if first_receipt {
            session.received_chunks += 1;
        }

        if session.state == UploadState::Initialized {
            session.state = UploadState::Receiving;
        }

        tracing::debug!(
            upload_id = %id,
            received = session.received_chunks,
            total = session.total_chunks,
            "Chunk stored"
        );

        Ok(session.clone())
    }

    /// Assemble a fully-received session and ingest the result.
    ///
    /// Completing an already-completed session returns the same catalog item.
    /// Assembly failures put the session back into Receiving so the client
    /// can retry.
    #[tracing::instrument(skip(self), fields(upload_id = %id))]
    pub async fn complete(&self, id: Uuid) -> AppResult<MediaItem> {
        let session = self.session(id).await?;

        let plan = {
            let mut session = session.lock().await;

            if session.state == UploadState::Completed {
                let media_id = session
                    .media_id
                    .ok_or_else(|| AppError::Internal("Completed session lost its item".to_string()))?;
                return self.uploads.catalog().get(media_id).await;
            }
            self.check_active(&mut session)?;
            if session.state == UploadState::Assembling {
                return Err(AppError::Conflict("Assembly already in progress".to_string()));
            }
            if !session.is_complete() {
                return Err(AppError::InvalidInput(format!(
                    "Upload incomplete: {}/{} chunks received",
                    session.received_chunks, session.total_chunks
                )));
            }

            // Claim the session before any I/O so cancel and the sweeper
            // leave it alone
            session.state = UploadState::Assembling;
            session.clone()
        };

        match self.assemble_and_ingest(&plan).await {
            Ok(item) => {
                {
                    let mut session = session.lock().await;
                    session.state = UploadState::Completed;
                    session.completed_at = Some(Utc::now());
                    session.media_id = Some(item.id);
                }
                self.delete_chunk_files(&plan).await;
                tracing::info!(upload_id = %id, media_id = %item.id, "Chunked upload completed");
                Ok(item)
            }
            Err(e) => {
                let mut session = session.lock().await;
                session.state = UploadState::Receiving;
                tracing::warn!(upload_id = %id, error = %e, "Assembly failed, session reopened");
                Err(e)
            }
        }
    }

    /// Cancel a session and discard its chunk files
    #[tracing::instrument(skip(self), fields(upload_id = %id))]
    pub async fn cancel(&self, id: Uuid) -> AppResult<()> {
        let session = self.session(id).await?;

        let plan = {
            let mut session = session.lock().await;
            match session.state {
                UploadState::Completed => {
                    return Err(AppError::Conflict("Session already completed".to_string()))
                }
                UploadState::Assembling => {
                    return Err(AppError::Conflict("Assembly in progress".to_string()))
                }
                UploadState::Cancelled => return Ok(()),
                _ => {}
            }
            session.state = UploadState::Cancelled;
            session.clone()
        };

        self.delete_chunk_files(&plan).await;
        tracing::info!(upload_id = %id, "Chunked upload cancelled");
        Ok(())
    }

    /// Current session snapshot
    pub async fn get(&self, id: Uuid) -> AppResult<ChunkedUpload> {
        let session = self.session(id).await?;
        let session = session.lock().await;
        Ok(session.clone())
    }

    /// Drop expired and cancelled sessions, deleting any chunk files they
    /// left behind. Sessions mid-assembly and completed sessions are kept.
    /// Returns the number of sessions removed.
    pub async fn gc_sweep(&self) -> usize {
        let snapshot: Vec<(Uuid, Arc<Mutex<ChunkedUpload>>)> = {
            let sessions = self.sessions.read().await;
            sessions.iter().map(|(id, s)| (*id, s.clone())).collect()
        };

        let now = Utc::now();
        let mut removable = Vec::new();

        for (id, session) in snapshot {
            let plan = {
                let mut session = session.lock().await;
                match session.state {
                    UploadState::Assembling | UploadState::Completed => continue,
                    UploadState::Cancelled => None,
                    _ if session.is_expired(now) => {
                        session.state = UploadState::Expired;
                        Some(session.clone())
                    }
                    UploadState::Expired => Some(session.clone()),
                    _ => continue,
                }
            };

            if let Some(plan) = plan {
                self.delete_chunk_files(&plan).await;
                tracing::info!(upload_id = %id, "Expired chunked upload discarded");
            }
            removable.push(id);
        }

        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for id in removable {
            // A session can leave the removable state while unlocked
            let still_removable = sessions.get(&id).is_some_and(|session| {
                session
                    .try_lock()
                    .map(|s| matches!(s.state, UploadState::Cancelled | UploadState::Expired))
                    .unwrap_or(false)
            });
            if still_removable {
                sessions.remove(&id);
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed = removed, "Chunked upload sweep finished");
        }
        removed
    }

    /// Count of live (non-terminal) sessions
    pub async fn active_sessions(&self) -> usize {
        let sessions = self.sessions.read().await;
        let mut active = 0;
        for session in sessions.values() {
            if !session.lock().await.state.is_terminal() {
                active += 1;
            }
        }
        active
    }

    async fn session(&self, id: Uuid) -> AppResult<Arc<Mutex<ChunkedUpload>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Upload session not found: {}", id)))
    }

    /// Reject terminal sessions, lazily expiring ones past their deadline
    fn check_active(&self, session: &mut ChunkedUpload) -> AppResult<()> {
        match session.state {
            UploadState::Completed | UploadState::Cancelled => Err(AppError::NotFound(format!(
                "Upload session not found: {}",
                session.id
            ))),
            UploadState::Expired => Err(AppError::Expired(format!(
                "Upload session expired: {}",
                session.id
            ))),
            _ if session.is_expired(Utc::now()) => {
                session.state = UploadState::Expired;
                Err(AppError::Expired(format!(
                    "Upload session expired: {}",
                    session.id
                )))
            }
            _ => Ok(()),
        }
    }

    /// Download every chunk in order, verify, and push the assembled bytes
    /// through the upload pipeline.
    async fn assemble_and_ingest(&self, plan: &ChunkedUpload) -> AppResult<MediaItem> {
        let mut assembled = Vec::with_capacity(plan.total_size as usize);

        for chunk in &plan.chunks {
            let key = plan.chunk_key(chunk.index);
            let data = self.storage.download(&key).await?;

            if let Some(ref expected) = chunk.checksum {
                let actual = ContentHash::digest(&data);
                if &actual != expected {
                    return Err(AppError::Storage(format!(
                        "Chunk {} failed verification",
                        chunk.index
                    )));
                }
            }
            assembled.extend_from_slice(&data);
        }

        if assembled.len() as u64 != plan.total_size {
            return Err(AppError::InvalidInput(format!(
                "Assembled size {} does not match declared size {}",
                assembled.len(),
                plan.total_size
            )));
        }

        let options = UploadOptions {
            folder_id: plan.folder_id,
            uploaded_by: plan.uploaded_by,
            ..UploadOptions::default()
        };

        let outcome = self
            .uploads
            .upload(&plan.filename, Some(&plan.content_type), assembled, options)
            .await?;
        Ok(outcome.item)
    }

    async fn delete_chunk_files(&self, session: &ChunkedUpload) -> usize {
        let mut deleted = 0;
        for chunk in &session.chunks {
            if !chunk.received {
                continue;
            }
            let key = session.chunk_key(chunk.index);
            match self.storage.delete(&key).await {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(key = %key, error = %e, "Failed to delete chunk file"),
            }
        }
        deleted
    }
}
