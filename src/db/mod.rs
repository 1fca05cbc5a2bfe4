//! Database layer for submirror
//!
//! Handles SQLite persistence for mirrored posts and their media download
//! bookkeeping (try counter, downloaded flag).
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`posts`] — Post CRUD and the media download data-access contract

use crate::types::PostId;
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod posts;

/// New post to be inserted into the database
///
/// Produced by the feed-ingestion collaborator; the download pipeline only ever
/// mutates the try counter and the downloaded flag of existing rows.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// The source platform's post id
    pub id: PostId,
    /// Subreddit the post belongs to
    pub subreddit: String,
    /// Post title
    pub title: String,
    /// Outbound URL, if the post has one
    pub url: Option<String>,
    /// Whether this is a text-only self post
    pub is_self: bool,
    /// URL of the cross-posted parent, if this is a cross-post
    pub crosspost_parent_url: Option<String>,
}

/// Post record from database (subset relevant to media downloading)
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    /// The source platform's post id
    pub id: PostId,
    /// Subreddit the post belongs to
    pub subreddit: String,
    /// Post title
    pub title: String,
    /// Outbound URL, if the post has one
    pub url: Option<String>,
    /// Whether this is a text-only self post
    pub is_self: bool,
    /// URL of the cross-posted parent, if this is a cross-post
    pub crosspost_parent_url: Option<String>,
    /// Media download attempts so far (monotonically incremented, capped by policy)
    pub media_download_tries: i64,
    /// Set true only when the media download succeeded
    pub media_has_downloaded: bool,
    /// Unix timestamp when the post was mirrored
    pub created_at: i64,
}

/// SQLite-backed persistence for mirrored posts
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
