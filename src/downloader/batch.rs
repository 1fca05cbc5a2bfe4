//! Batch orchestration — drives a bounded-concurrency sweep over a batch of posts.
//!
//! Per post: enforce the retry budget, persist the try increment, classify,
//! execute, and record the terminal outcome. A single post's failure never
//! aborts the batch.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::classifier;
use crate::db::Post;
use crate::error::Result;
use crate::types::PostId;

use super::MediaDownloader;
use super::executor::{self, ExecutionOutcome};

/// Download attempts allowed per post across batches
///
/// A post at or over this count is permanently cancelled in every batch until its
/// counter is externally reset.
pub const MAX_DOWNLOAD_TRIES: i64 = 3;

/// Cancellation reason for posts over the retry budget
pub const REASON_TOO_MANY_TRIES: &str = "Download Skipped: Too many download tries (3).";

impl MediaDownloader {
    /// Download media for a batch of posts
    ///
    /// Replaces the progress tracker's table with fresh records for this batch,
    /// then processes every post with at most `media_downloads_at_once` transfers
    /// running at a time. Completion order is unconstrained; the returned ids are
    /// the successfully downloaded posts in submission order.
    ///
    /// Per-post failures are recorded in the tracker and logged, never propagated;
    /// only batch-level initialization can fail.
    pub async fn download_batch(&self, posts: Vec<Post>) -> Result<Vec<PostId>> {
        self.tracker.initialize_batch(&posts);

        let limit = self.config.download.media_downloads_at_once.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));

        // One slot per post, kept in submission order so results can be
        // collected at each post's own index regardless of completion order
        let mut handles = Vec::with_capacity(posts.len());
        for post in posts {
            if post.media_download_tries >= MAX_DOWNLOAD_TRIES {
                tracing::debug!(
                    post_id = %post.id,
                    tries = post.media_download_tries,
                    "cancelling download, retry budget exhausted"
                );
                self.tracker.cancel(&post.id, REASON_TOO_MANY_TRIES);
                handles.push(None);
                continue;
            }

            let downloader = self.clone();
            let semaphore = Arc::clone(&semaphore);
            handles.push(Some(tokio::spawn(async move {
                downloader.process_post(post, semaphore).await
            })));
        }

        let mut succeeded = Vec::new();
        for handle in handles.into_iter().flatten() {
            match handle.await {
                Ok(Some(id)) => succeeded.push(id),
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "download task panicked"),
            }
        }

        Ok(succeeded)
    }

    /// Process one post end to end, returning its id on success
    ///
    /// Holds a semaphore permit for the whole attempt, bounding the number of
    /// posts in the started state.
    async fn process_post(&self, post: Post, semaphore: Arc<Semaphore>) -> Option<PostId> {
        let Ok(_permit) = semaphore.acquire_owned().await else {
            // Semaphore is never closed while a batch runs
            return None;
        };

        let id = post.id.clone();

        // Charge the attempt up front; skips and failures consume a try alike
        if let Err(e) = self.db.increment_media_download_try(&id).await {
            tracing::error!(post_id = %id, error = %e, "failed to persist download try");
            self.tracker.increment_try(&id);
            self.tracker.start(&id);
            self.tracker.fail(&id, &e.to_string());
            return None;
        }
        self.tracker.increment_try(&id);
        self.tracker.start(&id);

        let strategy = classifier::classify(&post, &self.config.download);
        match executor::execute(self, &post, strategy).await {
            Ok(ExecutionOutcome::Completed) => {
                self.tracker.succeed(&id);
                if let Err(e) = self.db.set_media_downloaded(&id).await {
                    // The media is on disk; losing the flag write is log-worthy
                    // but the post still counts as succeeded
                    tracing::error!(post_id = %id, error = %e, "failed to persist downloaded flag");
                }
                Some(id)
            }
            Ok(ExecutionOutcome::Skipped(reason)) => {
                tracing::debug!(post_id = %id, reason, "media download skipped");
                self.tracker.skip(&id, reason);
                None
            }
            Err(e) => {
                self.tracker.fail(&id, &e.to_string());
                if e.is_offline() {
                    // Expected during offline operation, kept out of the error log
                    tracing::debug!(post_id = %id, error = %e, "media download failed while offline");
                } else {
                    tracing::error!(post_id = %id, error = %e, "media download failed");
                }
                None
            }
        }
    }
}
