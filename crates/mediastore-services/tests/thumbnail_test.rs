#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{png_bytes, setup_engine, setup_engine_with};
use mediastore_core::models::{ImageSize, ResizeMode, UploadOptions};
use mediastore_core::AppError;

#[tokio::test]
async fn test_generate_default_presets() {
    let app = setup_engine().await;

    let outcome = app
        .engine
        .uploads()
        .upload("photo.png", Some("image/png"), png_bytes(800, 600, 1), UploadOptions::default())
        .await
        .unwrap();

    let report = app
        .engine
        .thumbnails()
        .generate_for_item(outcome.item.id)
        .await
        .unwrap();

    // thumbnail/small/medium render; large (1200px) would upscale an 800px source
    assert_eq!(report.generated, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert!(report.into_result().is_ok());

    let item = app.engine.catalog().get(outcome.item.id).await.unwrap();
    assert_eq!(item.thumbnails.len(), 3);

    let thumb = item
        .thumbnails
        .iter()
        .find(|t| t.size_name == "thumbnail")
        .unwrap();
    assert_eq!((thumb.width, thumb.height), (150, 150));
    assert!(app.storage.exists(&thumb.path).await.unwrap());
    assert_eq!(item.thumbnail_url("thumbnail"), Some(thumb.url.as_str()));
}

#[tokio::test]
async fn test_partial_failure_keeps_good_variants() {
    let app = setup_engine_with(|s| {
        s.image_sizes.push(ImageSize {
            name: "broken".to_string(),
            width: 0,
            height: 0,
            mode: ResizeMode::Fill,
            quality: 85,
            enabled: true,
        });
    })
    .await;

    let outcome = app
        .engine
        .uploads()
        .upload("photo.png", Some("image/png"), png_bytes(800, 600, 1), UploadOptions::default())
        .await
        .unwrap();

    let report = app
        .engine
        .thumbnails()
        .generate_for_item(outcome.item.id)
        .await
        .unwrap();

    assert_eq!(report.generated, 3);
    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.into_result(),
        Err(AppError::PartialFailure { failed: 1, total: 4 })
    ));

    // The good variants are still recorded
    let item = app.engine.catalog().get(outcome.item.id).await.unwrap();
    assert_eq!(item.thumbnails.len(), 3);
}

#[tokio::test]
async fn test_regenerate_replaces_variants_in_place() {
    let app = setup_engine().await;

    let outcome = app
        .engine
        .uploads()
        .upload("photo.png", Some("image/png"), png_bytes(800, 600, 1), UploadOptions::default())
        .await
        .unwrap();

    app.engine.thumbnails().generate_for_item(outcome.item.id).await.unwrap();
    let first = app.engine.catalog().get(outcome.item.id).await.unwrap();

    app.engine.thumbnails().generate_for_item(outcome.item.id).await.unwrap();
    let second = app.engine.catalog().get(outcome.item.id).await.unwrap();

    // Same preset set, no duplicate rows
    assert_eq!(first.thumbnails.len(), second.thumbnails.len());
    for thumb in &second.thumbnails {
        assert!(app.storage.exists(&thumb.path).await.unwrap());
    }
}

#[tokio::test]
async fn test_non_image_is_a_noop() {
    let app = setup_engine().await;

    let outcome = app
        .engine
        .uploads()
        .upload("notes.txt", Some("text/plain"), b"plain text".to_vec(), UploadOptions::default())
        .await
        .unwrap();

    let report = app
        .engine
        .thumbnails()
        .generate_for_item(outcome.item.id)
        .await
        .unwrap();

    assert_eq!(report.generated, 0);
    assert_eq!(report.failed, 0);

    let item = app.engine.catalog().get(outcome.item.id).await.unwrap();
    assert!(item.thumbnails.is_empty());
}

#[tokio::test]
async fn test_clear_cache_removes_artifacts_and_records() {
    let app = setup_engine().await;

    let outcome = app
        .engine
        .uploads()
        .upload("photo.png", Some("image/png"), png_bytes(800, 600, 1), UploadOptions::default())
        .await
        .unwrap();
    app.engine.thumbnails().generate_for_item(outcome.item.id).await.unwrap();

    let before = app.engine.catalog().get(outcome.item.id).await.unwrap();
    assert!(!before.thumbnails.is_empty());

    let deleted = app.engine.thumbnails().clear_cache().await.unwrap();
    assert_eq!(deleted, before.thumbnails.len());

    let after = app.engine.catalog().get(outcome.item.id).await.unwrap();
    assert!(after.thumbnails.is_empty());
    for thumb in &before.thumbnails {
        assert!(!app.storage.exists(&thumb.path).await.unwrap());
    }

    // The original is untouched
    assert!(app.storage.exists(&after.path).await.unwrap());
}

#[tokio::test]
async fn test_hard_delete_removes_thumbnail_artifacts() {
    let app = setup_engine().await;

    let outcome = app
        .engine
        .uploads()
        .upload("photo.png", Some("image/png"), png_bytes(800, 600, 1), UploadOptions::default())
        .await
        .unwrap();
    app.engine.thumbnails().generate_for_item(outcome.item.id).await.unwrap();
    let item = app.engine.catalog().get(outcome.item.id).await.unwrap();

    app.engine.catalog().hard_delete(item.id).await.unwrap();

    for thumb in &item.thumbnails {
        assert!(!app.storage.exists(&thumb.path).await.unwrap());
    }
    assert!(!app.storage.exists(&item.path).await.unwrap());
}
