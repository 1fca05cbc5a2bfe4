//! Core types for submirror

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a post (the source platform's base36 id)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    /// Create a new PostId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PostId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for PostId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for PostId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for PostId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Lifecycle state of one post's media download within the active batch
///
/// `Queued → TryIncremented → Started → {Succeeded | Failed | Cancelled | Skipped}`.
/// `Cancelled` is only reachable before `Started` (retry budget exceeded); the other
/// three outcomes are reachable only from `Started`. All four are terminal for the
/// attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadState {
    /// Waiting in the batch, not yet admitted
    Queued,
    /// Try counter incremented, about to start
    #[serde(rename = "download-try-incremented")]
    TryIncremented,
    /// Media transfer in progress
    Started,
    /// Media fully downloaded
    Succeeded,
    /// Transfer or filesystem failure
    Failed,
    /// Cancelled before start (retry budget exceeded)
    Cancelled,
    /// Deliberately skipped (no downloadable media)
    Skipped,
}

impl DownloadState {
    /// Whether this state is terminal for the current attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadState::Succeeded
                | DownloadState::Failed
                | DownloadState::Cancelled
                | DownloadState::Skipped
        )
    }
}

/// Live progress record for one post within the active batch
///
/// Exclusively owned and mutated by the [`DownloadTracker`](crate::tracker::DownloadTracker);
/// observers only ever see cloned snapshots or [`TrimmedRecord`] views.
#[derive(Clone, Debug)]
pub struct ProgressRecord {
    /// Post this record tracks
    pub post_id: PostId,
    /// Current lifecycle state
    pub state: DownloadState,
    /// Error description when the state is `Failed`
    pub error: Option<String>,
    /// Human-readable reason when the state is `Cancelled` or `Skipped`
    pub reason: Option<String>,
    /// Total file size in bytes (0 until the Content-Length header arrives)
    pub download_file_size: u64,
    /// Bytes transferred so far
    pub downloaded_bytes: u64,
    /// Instantaneous transfer speed in bytes per second
    pub download_speed: u64,
    /// Completion percentage (0.0 to 100.0)
    pub download_progress: f32,
    /// Download tries so far, mirrored from the persisted counter
    pub media_download_tries: i64,
}

impl ProgressRecord {
    /// Create a fresh `Queued` record for a post entering a new batch
    pub fn queued(post_id: PostId, media_download_tries: i64) -> Self {
        Self {
            post_id,
            state: DownloadState::Queued,
            error: None,
            reason: None,
            download_file_size: 0,
            downloaded_bytes: 0,
            download_speed: 0,
            download_progress: 0.0,
            media_download_tries,
        }
    }

    /// Trim this record down to the fields observers care about
    pub fn trimmed(&self) -> TrimmedRecord {
        TrimmedRecord {
            post_id: self.post_id.clone(),
            status: self.state,
            download_error: self.error.clone(),
            reason: self.reason.clone(),
            download_file_size: self.download_file_size,
            downloaded_bytes: self.downloaded_bytes,
            download_speed: self.download_speed,
            download_progress: self.download_progress,
            media_download_tries: self.media_download_tries,
        }
    }
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

/// Observer-facing view of a [`ProgressRecord`]
///
/// Empty and zero fields are omitted on serialization to keep event payloads small;
/// consumers treat a missing field as its zero value.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrimmedRecord {
    /// Post identifier
    pub post_id: PostId,
    /// Current lifecycle state
    pub status: DownloadState,
    /// Error description, if the download failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_error: Option<String>,
    /// Skip or cancel reason, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Total file size in bytes
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub download_file_size: u64,
    /// Bytes transferred so far
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub downloaded_bytes: u64,
    /// Transfer speed in bytes per second
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub download_speed: u64,
    /// Completion percentage (0.0 to 100.0)
    #[serde(default, skip_serializing_if = "is_zero_f32")]
    pub download_progress: f32,
    /// Download tries so far
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub media_download_tries: i64,
}

/// Event emitted during the media download lifecycle
///
/// One event per accepted tracker transition; subscribers receive all events via
/// the broadcast channel and may coalesce the high-frequency progress updates.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Event {
    /// A new batch replaced the tracker table; carries the full fresh snapshot
    NewDownloadBatchStarted {
        /// Fresh `Queued` records for every post in the batch, in submission order
        downloads: Vec<TrimmedRecord>,
    },

    /// The tracker table was cleared without starting a new batch
    DownloadsCleared,

    /// A post's persisted try counter was incremented
    DownloadMediaTryIncrement {
        /// Post identifier
        post_id: PostId,
    },

    /// Media transfer started for a post
    DownloadStarted {
        /// Post identifier
        post_id: PostId,
    },

    /// Streaming progress update (high frequency, consumers may coalesce)
    DownloadProgress {
        /// Post identifier
        post_id: PostId,
        /// Total file size in bytes (0 if unknown)
        download_file_size: u64,
        /// Bytes transferred so far
        downloaded_bytes: u64,
        /// Transfer speed in bytes per second
        download_speed: u64,
        /// Completion percentage (0.0 to 100.0)
        download_progress: f32,
    },

    /// Media fully downloaded for a post
    DownloadSucceeded {
        /// Post identifier
        post_id: PostId,
    },

    /// Media download failed for a post
    DownloadFailed {
        /// Post identifier
        post_id: PostId,
        /// Error description (never an opaque error object)
        err: String,
    },

    /// Download cancelled before start (retry budget exceeded)
    DownloadCancelled {
        /// Post identifier
        post_id: PostId,
        /// Human-readable cancellation reason
        reason: String,
    },

    /// Download deliberately skipped
    DownloadSkipped {
        /// Post identifier
        post_id: PostId,
        /// Human-readable skip reason
        reason: String,
    },
}
