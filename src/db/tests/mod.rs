use crate::db::*;
use crate::error::{DatabaseError, Error};
use crate::types::PostId;
use tempfile::NamedTempFile;

fn new_post(id: &str) -> NewPost {
    NewPost {
        id: PostId::new(id),
        subreddit: "pics".to_string(),
        title: format!("post {}", id),
        url: Some(format!("https://i.redd.it/{}.jpg", id)),
        is_self: false,
        crosspost_parent_url: None,
    }
}

#[tokio::test]
async fn test_insert_and_get_post() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.insert_post(&new_post("abc1")).await.unwrap();

    let post = db.get_post(&PostId::new("abc1")).await.unwrap().unwrap();
    assert_eq!(post.id.as_str(), "abc1");
    assert_eq!(post.subreddit, "pics");
    assert_eq!(post.url.as_deref(), Some("https://i.redd.it/abc1.jpg"));
    assert!(!post.is_self);
    assert_eq!(post.media_download_tries, 0);
    assert!(!post.media_has_downloaded);

    db.close().await;
}

#[tokio::test]
async fn test_get_post_missing_returns_none() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let post = db.get_post(&PostId::new("nope")).await.unwrap();
    assert!(post.is_none());

    db.close().await;
}

#[tokio::test]
async fn test_reingested_post_keeps_bookkeeping() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.insert_post(&new_post("abc1")).await.unwrap();
    db.increment_media_download_try(&PostId::new("abc1"))
        .await
        .unwrap();

    // Feed ingestion sees the same post again
    db.insert_post(&new_post("abc1")).await.unwrap();

    let post = db.get_post(&PostId::new("abc1")).await.unwrap().unwrap();
    assert_eq!(
        post.media_download_tries, 1,
        "re-ingestion must not reset the try counter"
    );

    db.close().await;
}

#[tokio::test]
async fn test_increment_media_download_try_returns_new_count() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let id = PostId::new("abc1");

    db.insert_post(&new_post("abc1")).await.unwrap();

    assert_eq!(db.increment_media_download_try(&id).await.unwrap(), 1);
    assert_eq!(db.increment_media_download_try(&id).await.unwrap(), 2);
    assert_eq!(db.increment_media_download_try(&id).await.unwrap(), 3);

    db.close().await;
}

#[tokio::test]
async fn test_increment_missing_post_returns_not_found() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let result = db.increment_media_download_try(&PostId::new("nope")).await;
    match result {
        Err(Error::Database(DatabaseError::NotFound(msg))) => {
            assert!(msg.contains("nope"), "error should name the post: {}", msg);
        }
        other => panic!("expected NotFound error, got: {:?}", other),
    }

    db.close().await;
}

#[tokio::test]
async fn test_set_media_downloaded() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let id = PostId::new("abc1");

    db.insert_post(&new_post("abc1")).await.unwrap();
    db.set_media_downloaded(&id).await.unwrap();

    let post = db.get_post(&id).await.unwrap().unwrap();
    assert!(post.media_has_downloaded);

    db.close().await;
}

#[tokio::test]
async fn test_list_posts_pending_media_excludes_done_and_capped() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    for id in ["a", "b", "c"] {
        db.insert_post(&new_post(id)).await.unwrap();
    }

    // "a" is downloaded, "b" burned its retry budget
    db.set_media_downloaded(&PostId::new("a")).await.unwrap();
    for _ in 0..3 {
        db.increment_media_download_try(&PostId::new("b"))
            .await
            .unwrap();
    }

    let pending = db.list_posts_pending_media(3).await.unwrap();
    let ids: Vec<&str> = pending.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["c"]);

    db.close().await;
}

#[tokio::test]
async fn test_reset_media_download_tries_restores_eligibility() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let id = PostId::new("abc1");

    db.insert_post(&new_post("abc1")).await.unwrap();
    for _ in 0..3 {
        db.increment_media_download_try(&id).await.unwrap();
    }
    assert!(db.list_posts_pending_media(3).await.unwrap().is_empty());

    db.reset_media_download_tries(&id).await.unwrap();

    let pending = db.list_posts_pending_media(3).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].media_download_tries, 0);

    db.close().await;
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    db.insert_post(&new_post("abc1")).await.unwrap();
    db.close().await;

    // Reopening the same file must not re-apply the schema
    let db = Database::new(temp_file.path()).await.unwrap();
    let post = db.get_post(&PostId::new("abc1")).await.unwrap();
    assert!(post.is_some());
    db.close().await;
}
