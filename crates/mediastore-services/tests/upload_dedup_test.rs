#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{png_bytes, setup_engine, setup_engine_with};
use mediastore_core::models::UploadOptions;
use mediastore_core::AppError;

#[tokio::test]
async fn test_duplicate_content_resolves_to_existing_item() {
    let app = setup_engine().await;
    let bytes = png_bytes(64, 64, 1);

    let first = app
        .engine
        .uploads()
        .upload("photo.png", Some("image/png"), bytes.clone(), UploadOptions::default())
        .await
        .unwrap();
    assert!(!first.deduplicated);

    // Same bytes under a different filename still dedup
    let second = app
        .engine
        .uploads()
        .upload("copy-of-photo.png", Some("image/png"), bytes, UploadOptions::default())
        .await
        .unwrap();

    assert!(second.deduplicated);
    assert_eq!(second.item.id, first.item.id);

    let stats = app.engine.catalog().stats().await;
    assert_eq!(stats.total_items, 1);
}

#[tokio::test]
async fn test_distinct_content_creates_distinct_items() {
    let app = setup_engine().await;

    let first = app
        .engine
        .uploads()
        .upload("a.png", Some("image/png"), png_bytes(64, 64, 1), UploadOptions::default())
        .await
        .unwrap();
    let second = app
        .engine
        .uploads()
        .upload("b.png", Some("image/png"), png_bytes(64, 64, 2), UploadOptions::default())
        .await
        .unwrap();

    assert_ne!(first.item.id, second.item.id);
    assert_ne!(first.item.content_hash, second.item.content_hash);
}

#[tokio::test]
async fn test_dedup_disabled_stores_both_copies() {
    let app = setup_engine_with(|s| s.deduplicate = false).await;
    let bytes = png_bytes(32, 32, 7);

    let first = app
        .engine
        .uploads()
        .upload("a.png", Some("image/png"), bytes.clone(), UploadOptions::default())
        .await
        .unwrap();
    let second = app
        .engine
        .uploads()
        .upload("b.png", Some("image/png"), bytes, UploadOptions::default())
        .await
        .unwrap();

    assert!(!second.deduplicated);
    assert_ne!(first.item.id, second.item.id);
    assert_eq!(first.item.content_hash, second.item.content_hash);
}

#[tokio::test]
async fn test_hard_delete_frees_hash_for_reupload() {
    let app = setup_engine().await;
    let bytes = png_bytes(48, 48, 3);

    let first = app
        .engine
        .uploads()
        .upload("a.png", Some("image/png"), bytes.clone(), UploadOptions::default())
        .await
        .unwrap();

    app.engine.catalog().hard_delete(first.item.id).await.unwrap();
    assert!(!app.storage.exists(&first.item.path).await.unwrap());

    let again = app
        .engine
        .uploads()
        .upload("a.png", Some("image/png"), bytes, UploadOptions::default())
        .await
        .unwrap();
    assert!(!again.deduplicated);
    assert_ne!(again.item.id, first.item.id);
}

#[tokio::test]
async fn test_soft_deleted_item_still_wins_dedup() {
    let app = setup_engine().await;
    let bytes = png_bytes(48, 48, 5);

    let first = app
        .engine
        .uploads()
        .upload("a.png", Some("image/png"), bytes.clone(), UploadOptions::default())
        .await
        .unwrap();
    app.engine.catalog().soft_delete(first.item.id).await.unwrap();

    let second = app
        .engine
        .uploads()
        .upload("a.png", Some("image/png"), bytes, UploadOptions::default())
        .await
        .unwrap();
    assert!(second.deduplicated);
    assert_eq!(second.item.id, first.item.id);
}

#[tokio::test]
async fn test_upload_rejects_oversized_payload() {
    let app = setup_engine_with(|s| s.max_file_size = 16).await;

    let result = app
        .engine
        .uploads()
        .upload("big.txt", Some("text/plain"), vec![0u8; 64], UploadOptions::default())
        .await;

    assert!(matches!(result, Err(AppError::PayloadTooLarge { size: 64, max: 16 })));
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let app = setup_engine().await;

    let result = app
        .engine
        .uploads()
        .upload("tool.exe", None, vec![1, 2, 3], UploadOptions::default())
        .await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}
