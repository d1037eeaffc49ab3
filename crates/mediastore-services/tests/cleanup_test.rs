#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{setup_engine, setup_engine_with, split_chunks};
use mediastore_core::models::InitChunkedUploadRequest;
use mediastore_core::AppError;

fn init_request() -> InitChunkedUploadRequest {
    InitChunkedUploadRequest {
        filename: "clip.mp4".to_string(),
        content_type: "video/mp4".to_string(),
        total_size: 25,
        chunk_size: 10,
        total_chunks: 3,
        folder_id: None,
        uploaded_by: None,
    }
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_expired_session_rejects_chunks() {
    // Sessions are born past their deadline
    let app = setup_engine_with(|s| s.chunk_expiry_hours = -1).await;

    let session = app.engine.chunked().init(init_request()).await.unwrap();
    let result = app.engine.chunked().receive_chunk(session.id, 0, vec![0u8; 10]).await;

    assert!(matches!(result, Err(AppError::Expired(_))));
}

#[tokio::test]
async fn test_sweep_removes_expired_sessions() {
    let app = setup_engine_with(|s| s.chunk_expiry_hours = -1).await;

    let session = app.engine.chunked().init(init_request()).await.unwrap();

    let removed = app.engine.chunked().gc_sweep().await;
    assert_eq!(removed, 1);
    assert!(app.engine.chunked().get(session.id).await.is_err());
}

#[tokio::test]
async fn test_sweep_leaves_live_and_completed_sessions() {
    let app = setup_engine().await;
    let data = payload(25);
    let chunks = split_chunks(&data, 10);

    // One in-flight session, one completed
    let live = app.engine.chunked().init(init_request()).await.unwrap();
    app.engine
        .chunked()
        .receive_chunk(live.id, 0, chunks[0].clone())
        .await
        .unwrap();

    let done = app.engine.chunked().init(init_request()).await.unwrap();
    for (index, chunk) in chunks.iter().enumerate() {
        app.engine
            .chunked()
            .receive_chunk(done.id, index as u32, chunk.clone())
            .await
            .unwrap();
    }
    let item = app.engine.chunked().complete(done.id).await.unwrap();

    let removed = app.engine.chunked().gc_sweep().await;
    assert_eq!(removed, 0);

    // Both sessions still resolve; the completed one keeps its item link
    assert!(app.engine.chunked().get(live.id).await.is_ok());
    let done = app.engine.chunked().get(done.id).await.unwrap();
    assert_eq!(done.media_id, Some(item.id));
}

#[tokio::test]
async fn test_sweep_removes_cancelled_sessions() {
    let app = setup_engine().await;

    let session = app.engine.chunked().init(init_request()).await.unwrap();
    app.engine.chunked().cancel(session.id).await.unwrap();

    let removed = app.engine.chunked().gc_sweep().await;
    assert_eq!(removed, 1);
    assert!(app.engine.chunked().get(session.id).await.is_err());
}

#[tokio::test]
async fn test_run_once_counts_removed_sessions() {
    let app = setup_engine_with(|s| s.chunk_expiry_hours = -1).await;

    app.engine.chunked().init(init_request()).await.unwrap();
    app.engine.chunked().init(init_request()).await.unwrap();

    let cleanup = mediastore_services::CleanupService::new(app.engine.chunked().clone());
    assert_eq!(cleanup.run_once().await, 2);
    assert_eq!(cleanup.run_once().await, 0);
}
