//! Shared test helpers for creating MediaDownloader instances in tests.

use crate::config::Config;
use crate::db::{NewPost, Post};
use crate::downloader::MediaDownloader;
use crate::types::PostId;
use tempfile::tempdir;

/// Helper to create a test MediaDownloader instance backed by a tempdir.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader() -> (MediaDownloader, tempfile::TempDir) {
    create_test_downloader_with_limit(2).await
}

/// Like [`create_test_downloader`] but with an explicit concurrency limit.
pub(crate) async fn create_test_downloader_with_limit(
    limit: usize,
) -> (MediaDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");
    config.download.media_dir = temp_dir.path().join("media");
    config.download.media_downloads_at_once = limit;
    config.download.progress_interval_ms = 10;
    config.download.request_timeout_secs = 30;

    let downloader = MediaDownloader::new(config).await.unwrap();

    (downloader, temp_dir)
}

/// Insert a post and return it as the feed collaborator would hand it over.
pub(crate) async fn seed_post(
    downloader: &MediaDownloader,
    id: &str,
    url: Option<&str>,
    is_self: bool,
) -> Post {
    downloader
        .db
        .insert_post(&NewPost {
            id: PostId::new(id),
            subreddit: "pics".to_string(),
            title: format!("post {}", id),
            url: url.map(str::to_string),
            is_self,
            crosspost_parent_url: None,
        })
        .await
        .unwrap();

    downloader
        .db
        .get_post(&PostId::new(id))
        .await
        .unwrap()
        .unwrap()
}

/// Burn a post's retry budget by incrementing the persisted counter `n` times,
/// returning the refreshed post.
pub(crate) async fn burn_tries(downloader: &MediaDownloader, id: &str, n: i64) -> Post {
    let post_id = PostId::new(id);
    for _ in 0..n {
        downloader
            .db
            .increment_media_download_try(&post_id)
            .await
            .unwrap();
    }
    downloader.db.get_post(&post_id).await.unwrap().unwrap()
}
