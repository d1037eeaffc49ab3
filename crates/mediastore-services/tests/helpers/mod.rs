#![allow(dead_code)]

use std::sync::Arc;

use mediastore_core::MediaSettings;
use mediastore_services::MediaEngine;
use mediastore_storage::{LocalStorage, Storage};
use tempfile::TempDir;

/// Engine wired to a temp-dir local backend, with a handle on the storage
/// so tests can inspect stored bytes directly.
pub struct TestEngine {
    pub engine: MediaEngine,
    pub storage: Arc<dyn Storage>,
    _dir: TempDir,
}

pub async fn setup_engine() -> TestEngine {
    setup_engine_with(|_| {}).await
}

pub async fn setup_engine_with(tweak: impl FnOnce(&mut MediaSettings)) -> TestEngine {
    let dir = TempDir::new().unwrap();

    let mut settings = MediaSettings::default();
    settings.storage_path = dir.path().to_str().unwrap().to_string();
    // Deterministic layout and no background rendering unless a test opts in
    settings.organize_by_date = false;
    settings.generate_thumbnails = false;
    tweak(&mut settings);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(settings.storage_path.clone(), settings.base_url.clone())
            .await
            .unwrap(),
    );

    TestEngine {
        engine: MediaEngine::with_storage(settings, storage.clone()),
        storage,
        _dir: dir,
    }
}

/// PNG fixture; `seed` varies pixel content so different seeds hash differently.
pub fn png_bytes(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            (x as u8).wrapping_add(seed),
            (y as u8).wrapping_mul(3),
            seed,
            255,
        ])
    });

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Split a payload into fixed-size chunks, last one short.
pub fn split_chunks(data: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    data.chunks(chunk_size).map(|c| c.to_vec()).collect()
}
