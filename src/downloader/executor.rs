//! Download execution — performs one post's classified transfer.
//!
//! Direct downloads stream the response body to a file under the post's media
//! folder, pushing recomputed progress into the tracker as bytes arrive. Skip
//! strategies do no I/O at all.

use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::classifier::MediaStrategy;
use crate::db::Post;
use crate::error::DownloadError;
use crate::utils;

use super::MediaDownloader;

/// Skip reason recorded for the reserved page-capture strategy
pub(crate) const REASON_PAGE_CAPTURE: &str = "Page capture not implemented";

/// How one post's execution ended, short of an error
#[derive(Debug)]
pub(crate) enum ExecutionOutcome {
    /// Media fully written to disk
    Completed,
    /// Deliberate skip; not a failure
    Skipped(&'static str),
}

/// Execute a post's classified strategy
///
/// Skips return without touching the network or filesystem — in particular no
/// post folder is created for them.
pub(crate) async fn execute(
    downloader: &MediaDownloader,
    post: &Post,
    strategy: MediaStrategy,
) -> Result<ExecutionOutcome, DownloadError> {
    match strategy {
        MediaStrategy::DirectDownload => {
            download_direct(downloader, post).await?;
            Ok(ExecutionOutcome::Completed)
        }
        MediaStrategy::PageCapture => Ok(ExecutionOutcome::Skipped(REASON_PAGE_CAPTURE)),
        MediaStrategy::Skip { reason } => Ok(ExecutionOutcome::Skipped(reason)),
    }
}

/// Stream the post's URL into `media_dir/<post id>/<file name>`
///
/// The post folder is created if absent (a pre-existing folder is reused).
/// Progress is recomputed per chunk but pushed to the tracker at most once per
/// `progress_interval_ms`, plus a final push when the stream ends.
async fn download_direct(
    downloader: &MediaDownloader,
    post: &Post,
) -> Result<(), DownloadError> {
    let url = post.url.as_deref().ok_or(DownloadError::MissingUrl)?;

    let post_dir = downloader.config.download.media_dir.join(post.id.as_str());
    tokio::fs::create_dir_all(&post_dir)
        .await
        .map_err(|e| DownloadError::Filesystem {
            path: post_dir.clone(),
            source: e,
        })?;

    let response = downloader
        .client
        .get(url)
        .send()
        .await
        .map_err(DownloadError::Transfer)?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
        return Err(DownloadError::Gone {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(DownloadError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    // Total size stays 0 until/unless the Content-Length header says otherwise
    let total_size = response.content_length().unwrap_or(0);
    let file_name = utils::media_file_name(&response, url);
    let file_path = post_dir.join(file_name);

    let file = tokio::fs::File::create(&file_path)
        .await
        .map_err(|e| DownloadError::Filesystem {
            path: file_path.clone(),
            source: e,
        })?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();

    let push_interval = Duration::from_millis(downloader.config.download.progress_interval_ms);
    let started = Instant::now();
    let mut last_push: Option<Instant> = None;
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(DownloadError::Transfer)?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::Filesystem {
                path: file_path.clone(),
                source: e,
            })?;
        downloaded += chunk.len() as u64;

        if last_push.is_none_or(|t| t.elapsed() >= push_interval) {
            push_progress(downloader, post, total_size, downloaded, started.elapsed());
            last_push = Some(Instant::now());
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::Filesystem {
            path: file_path.clone(),
            source: e,
        })?;

    // Final push: the size is certain now even when Content-Length was missing
    let final_size = if total_size == 0 { downloaded } else { total_size };
    push_progress(downloader, post, final_size, downloaded, started.elapsed());

    tracing::debug!(
        post_id = %post.id,
        path = %file_path.display(),
        bytes = downloaded,
        "media file written"
    );

    Ok(())
}

/// Recompute speed and percentage and push one progress update into the tracker
fn push_progress(
    downloader: &MediaDownloader,
    post: &Post,
    total_size: u64,
    downloaded: u64,
    elapsed: Duration,
) {
    let speed = if elapsed.as_secs_f64() > 0.0 {
        (downloaded as f64 / elapsed.as_secs_f64()) as u64
    } else {
        0
    };
    let percent = if total_size > 0 {
        ((downloaded as f64 / total_size as f64) * 100.0).min(100.0) as f32
    } else {
        0.0
    };
    downloader
        .tracker
        .progress(&post.id, total_size, downloaded, speed, percent);
}
