use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::chunked::ChunkedUploadTracker;

const SWEEP_INTERVAL_SECS: u64 = 3600;

/// Background maintenance for chunked upload sessions
#[derive(Clone)]
pub struct CleanupService {
    tracker: ChunkedUploadTracker,
    sweep_interval: Duration,
}

impl CleanupService {
    pub fn new(tracker: ChunkedUploadTracker) -> Self {
        Self {
            tracker,
            sweep_interval: Duration::from_secs(SWEEP_INTERVAL_SECS),
        }
    }

    pub fn with_interval(tracker: ChunkedUploadTracker, sweep_interval: Duration) -> Self {
        Self {
            tracker,
            sweep_interval,
        }
    }

    /// Start the background sweep that runs every hour
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            loop {
                sweep_interval.tick().await;

                tracing::info!("Starting scheduled sweep of expired upload sessions");

                let removed = self.tracker.gc_sweep().await;

                tracing::info!(removed, "Sweep completed");
            }
        })
    }

    /// Run one sweep immediately, returning the number of sessions removed
    pub async fn run_once(&self) -> usize {
        self.tracker.gc_sweep().await
    }
}
