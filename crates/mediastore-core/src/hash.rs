//! Content hashing
//!
//! SHA-256 digests over file content, used as the deduplication key and for
//! per-chunk integrity checksums. The streaming variant reads in fixed-size
//! buffers so memory stays constant regardless of input size.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::AppError;

const STREAM_BUF_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 digest of a file's full byte content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Digest an in-memory byte slice.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }

    /// Digest an async byte stream with constant memory.
    ///
    /// An IO error while reading propagates; a partial hash is never returned.
    pub async fn digest_stream<R>(mut reader: R) -> Result<Self, AppError>
    where
        R: AsyncRead + Unpin,
    {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; STREAM_BUF_SIZE];

        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to read content stream: {}", e)))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(ContentHash(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let a = ContentHash::digest(b"hello world");
        let b = ContentHash::digest(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_differs_for_different_content() {
        let a = ContentHash::digest(b"hello world");
        let b = ContentHash::digest(b"hello worlds");
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_known_vector() {
        // SHA-256 of the empty string
        let h = ContentHash::digest(b"");
        assert_eq!(
            h.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_digest_stream_matches_in_memory() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let in_memory = ContentHash::digest(&data);
        let streamed = ContentHash::digest_stream(std::io::Cursor::new(data))
            .await
            .unwrap();
        assert_eq!(in_memory, streamed);
    }
}
