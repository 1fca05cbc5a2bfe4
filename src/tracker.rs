//! In-memory download progress tracking
//!
//! One table per process, keyed by post id, holding the live lifecycle record for
//! every post in the active batch. The table is owned exclusively by
//! [`DownloadTracker`]; callers go through its explicit transition methods and
//! observers receive read-only snapshots and broadcast events.
//!
//! A new batch fully replaces the table, so transitions arriving for posts of a
//! superseded batch find no record and are dropped.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

use crate::db::Post;
use crate::types::{DownloadState, Event, PostId, ProgressRecord, TrimmedRecord};

/// The active batch's records plus submission order for stable snapshots
#[derive(Default)]
struct BatchTable {
    order: Vec<PostId>,
    records: HashMap<PostId, ProgressRecord>,
}

/// Process-wide tracker for per-post download lifecycle state
///
/// Every accepted transition emits exactly one [`Event`] on the broadcast
/// channel. The mutex is held only across the read-modify-write and the
/// (synchronous) event send, never across an await point.
pub struct DownloadTracker {
    table: Mutex<BatchTable>,
    event_tx: broadcast::Sender<Event>,
}

impl DownloadTracker {
    /// Create a tracker that emits events on the given broadcast channel
    pub fn new(event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            table: Mutex::new(BatchTable::default()),
            event_tx,
        }
    }

    /// Replace the table with fresh `Queued` records for a new batch
    ///
    /// All prior records are discarded, including unfinished ones; their late
    /// transitions will be dropped as stale. Emits a batch-started event carrying
    /// the full fresh snapshot in submission order.
    pub fn initialize_batch(&self, posts: &[Post]) {
        let mut table = self.lock_table();
        table.order = posts.iter().map(|p| p.id.clone()).collect();
        table.records = posts
            .iter()
            .map(|p| {
                (
                    p.id.clone(),
                    ProgressRecord::queued(p.id.clone(), p.media_download_tries),
                )
            })
            .collect();
        let downloads = snapshot_locked(&table);
        self.emit(Event::NewDownloadBatchStarted { downloads });
    }

    /// Drop every record without starting a new batch
    pub fn clear(&self) {
        let mut table = self.lock_table();
        table.order.clear();
        table.records.clear();
        self.emit(Event::DownloadsCleared);
    }

    /// `Queued → TryIncremented`; mirrors the persisted try counter
    pub fn increment_try(&self, post_id: &PostId) {
        self.transition(post_id, DownloadState::Queued, |record| {
            record.state = DownloadState::TryIncremented;
            record.media_download_tries += 1;
            Event::DownloadMediaTryIncrement {
                post_id: record.post_id.clone(),
            }
        });
    }

    /// `TryIncremented → Started`
    pub fn start(&self, post_id: &PostId) {
        self.transition(post_id, DownloadState::TryIncremented, |record| {
            record.state = DownloadState::Started;
            Event::DownloadStarted {
                post_id: record.post_id.clone(),
            }
        });
    }

    /// Intra-`Started` numeric progress update; does not change lifecycle state
    pub fn progress(
        &self,
        post_id: &PostId,
        download_file_size: u64,
        downloaded_bytes: u64,
        download_speed: u64,
        download_progress: f32,
    ) {
        self.transition(post_id, DownloadState::Started, |record| {
            record.download_file_size = download_file_size;
            record.downloaded_bytes = downloaded_bytes;
            record.download_speed = download_speed;
            record.download_progress = download_progress;
            Event::DownloadProgress {
                post_id: record.post_id.clone(),
                download_file_size,
                downloaded_bytes,
                download_speed,
                download_progress,
            }
        });
    }

    /// `Started → Succeeded`
    pub fn succeed(&self, post_id: &PostId) {
        self.transition(post_id, DownloadState::Started, |record| {
            record.state = DownloadState::Succeeded;
            record.download_progress = 100.0;
            Event::DownloadSucceeded {
                post_id: record.post_id.clone(),
            }
        });
    }

    /// `Started → Failed`, attaching the error description
    pub fn fail(&self, post_id: &PostId, error: &str) {
        self.transition(post_id, DownloadState::Started, |record| {
            record.state = DownloadState::Failed;
            record.error = Some(error.to_string());
            Event::DownloadFailed {
                post_id: record.post_id.clone(),
                err: error.to_string(),
            }
        });
    }

    /// `Started → Skipped` with a human-readable reason
    pub fn skip(&self, post_id: &PostId, reason: &str) {
        self.transition(post_id, DownloadState::Started, |record| {
            record.state = DownloadState::Skipped;
            record.reason = Some(reason.to_string());
            Event::DownloadSkipped {
                post_id: record.post_id.clone(),
                reason: reason.to_string(),
            }
        });
    }

    /// Cancel a post before it starts (retry budget exceeded)
    ///
    /// Accepted only from `Queued` or `TryIncremented`; a post that has started
    /// always runs to one of the other terminal states.
    pub fn cancel(&self, post_id: &PostId, reason: &str) {
        let mut table = self.lock_table();
        let Some(record) = table.records.get_mut(post_id) else {
            tracing::debug!(post_id = %post_id, "dropping stale cancel for superseded batch");
            return;
        };
        if !matches!(
            record.state,
            DownloadState::Queued | DownloadState::TryIncremented
        ) {
            tracing::warn!(
                post_id = %post_id,
                state = ?record.state,
                "ignoring cancel after download start"
            );
            return;
        }
        record.state = DownloadState::Cancelled;
        record.reason = Some(reason.to_string());
        self.emit(Event::DownloadCancelled {
            post_id: post_id.clone(),
            reason: reason.to_string(),
        });
    }

    /// Clone the current record for one post, if it is in the active batch
    pub fn get(&self, post_id: &PostId) -> Option<ProgressRecord> {
        self.lock_table().records.get(post_id).cloned()
    }

    /// Trimmed snapshot of the whole table in submission order
    pub fn snapshot(&self) -> Vec<TrimmedRecord> {
        snapshot_locked(&self.lock_table())
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run a guarded transition: the record must exist and be in `expected` state
    fn transition(
        &self,
        post_id: &PostId,
        expected: DownloadState,
        apply: impl FnOnce(&mut ProgressRecord) -> Event,
    ) {
        let mut table = self.lock_table();
        let Some(record) = table.records.get_mut(post_id) else {
            tracing::debug!(post_id = %post_id, "dropping stale update for superseded batch");
            return;
        };
        if record.state != expected {
            tracing::warn!(
                post_id = %post_id,
                state = ?record.state,
                expected = ?expected,
                "ignoring out-of-order tracker transition"
            );
            return;
        }
        let event = apply(record);
        self.emit(event);
    }

    fn lock_table(&self) -> std::sync::MutexGuard<'_, BatchTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send an event to all subscribers; dropped silently when nobody listens
    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

fn snapshot_locked(table: &BatchTable) -> Vec<TrimmedRecord> {
    table
        .order
        .iter()
        .filter_map(|id| table.records.get(id))
        .map(ProgressRecord::trimmed)
        .collect()
}
