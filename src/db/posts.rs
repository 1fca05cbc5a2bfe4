//! Post CRUD and the media download data-access contract.

use crate::error::DatabaseError;
use crate::types::PostId;
use crate::{Error, Result};

use super::{Database, NewPost, Post};

const POST_COLUMNS: &str = r#"
    id, subreddit, title, url, is_self, crosspost_parent_url,
    media_download_tries, media_has_downloaded, created_at
"#;

impl Database {
    /// Insert a mirrored post
    ///
    /// Idempotent for re-ingested feeds: an existing row is left untouched so the
    /// download bookkeeping (tries, downloaded flag) survives repeated ingestion.
    pub async fn insert_post(&self, post: &NewPost) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO posts (
                id, subreddit, title, url, is_self, crosspost_parent_url,
                media_download_tries, media_has_downloaded, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&post.id)
        .bind(&post.subreddit)
        .bind(&post.title)
        .bind(&post.url)
        .bind(post.is_self)
        .bind(&post.crosspost_parent_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert post: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get a post by id
    pub async fn get_post(&self, id: &PostId) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = ?",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get post: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List posts whose media has not been downloaded and whose try count is
    /// below `max_tries`, oldest first
    ///
    /// This is the batch source for the download orchestrator. Posts at or over
    /// the cap stay excluded until their counter is reset.
    pub async fn list_posts_pending_media(&self, max_tries: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {}
            FROM posts
            WHERE media_has_downloaded = 0 AND media_download_tries < ?
            ORDER BY created_at ASC
            "#,
            POST_COLUMNS
        ))
        .bind(max_tries)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list posts pending media: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Increment a post's media download try counter, returning the new value
    pub async fn increment_media_download_try(&self, id: &PostId) -> Result<i64> {
        let result = sqlx::query(
            "UPDATE posts SET media_download_tries = media_download_tries + 1 WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to increment media download try: {}",
                e
            )))
        })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "post {} not found",
                id
            ))));
        }

        let tries: i64 =
            sqlx::query_scalar("SELECT media_download_tries FROM posts WHERE id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to read media download tries: {}",
                        e
                    )))
                })?;

        Ok(tries)
    }

    /// Mark a post's media as downloaded
    pub async fn set_media_downloaded(&self, id: &PostId) -> Result<()> {
        let result = sqlx::query("UPDATE posts SET media_has_downloaded = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to set media downloaded: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "post {} not found",
                id
            ))));
        }

        Ok(())
    }

    /// Reset a post's try counter so a permanently-skipped post becomes
    /// eligible for future batches again
    pub async fn reset_media_download_tries(&self, id: &PostId) -> Result<()> {
        let result = sqlx::query("UPDATE posts SET media_download_tries = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to reset media download tries: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "post {} not found",
                id
            ))));
        }

        Ok(())
    }
}
