//! Core media download pipeline split into focused submodules.
//!
//! - [`batch`] - Batch orchestration: retry budget, bounded concurrency, persistence
//! - [`executor`] - Per-post download execution and streaming progress

mod batch;
mod executor;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use batch::{MAX_DOWNLOAD_TRIES, REASON_TOO_MANY_TRIES};

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::tracker::DownloadTracker;
use crate::types::{Event, PostId, TrimmedRecord};

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to query post status
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Shared HTTP client for media fetches
    pub(crate) client: reqwest::Client,
    /// Live per-post download state for the active batch
    pub(crate) tracker: Arc<DownloadTracker>,
}

impl MediaDownloader {
    /// Create a new MediaDownloader instance
    ///
    /// This initializes all core components:
    /// - Creates the media download root directory
    /// - Opens/creates the SQLite database and runs migrations
    /// - Sets up the event broadcast channel and progress tracker
    /// - Builds the shared HTTP client
    pub async fn new(config: Config) -> Result<Self> {
        tokio::fs::create_dir_all(&config.download.media_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create media directory '{}': {}",
                        config.download.media_dir.display(),
                        e
                    ),
                ))
            })?;

        let db = Database::new(&config.persistence.database_path).await?;

        // Broadcast channel with buffer size of 1000 events; multiple subscribers
        // receive all events independently
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let tracker = Arc::new(DownloadTracker::new(event_tx.clone()));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download.request_timeout_secs))
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            db: Arc::new(db),
            event_tx,
            config: Arc::new(config),
            client,
            tracker,
        })
    }

    /// Subscribe to download events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently. Events are buffered, but if a subscriber falls behind by
    /// more than 1000 events, it will receive a `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Trimmed snapshot of the active batch's progress table, in submission order
    ///
    /// This is what a freshly-attached observer replays before streaming live
    /// updates.
    pub fn progress_snapshot(&self) -> Vec<TrimmedRecord> {
        self.tracker.snapshot()
    }

    /// Run a download batch over every post still pending media
    ///
    /// Convenience wrapper around [`download_batch`](Self::download_batch) using
    /// the database as the batch source. Posts at the retry cap are excluded by
    /// the query itself.
    pub async fn download_pending(&self) -> Result<Vec<PostId>> {
        let posts = self.db.list_posts_pending_media(MAX_DOWNLOAD_TRIES).await?;
        self.download_batch(posts).await
    }

    /// Shut down: close the database connection pool
    ///
    /// Any batch still running keeps its tracker state but further persistence
    /// fails, so call this only after in-flight batches finish.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down media downloader");
        self.db.close().await;
        Ok(())
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with download processing and listens on the
    /// configured bind address (default: 127.0.0.1:8080).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
