#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use mediastore_core::MediaSettings;
use std::sync::Arc;

/// Create a storage backend from settings
pub async fn create_storage(settings: &MediaSettings) -> StorageResult<Arc<dyn Storage>> {
    match settings.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            if settings.s3_bucket.is_empty() {
                return Err(StorageError::ConfigError(
                    "S3 bucket not configured".to_string(),
                ));
            }

            let storage = S3Storage::new(
                settings.s3_bucket.clone(),
                settings.s3_region.clone(),
                settings.s3_endpoint.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = LocalStorage::new(
                settings.storage_path.clone(),
                settings.effective_base_url().to_string(),
            )
            .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_local_storage_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = MediaSettings::default();
        settings.storage_path = dir.path().to_str().unwrap().to_string();

        let storage = create_storage(&settings).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert!(storage.health_check().await.is_ok());
    }

    #[cfg(feature = "storage-s3")]
    #[tokio::test]
    async fn test_s3_requires_bucket() {
        let mut settings = MediaSettings::default();
        settings.storage_backend = StorageBackend::S3;

        let result = create_storage(&settings).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
