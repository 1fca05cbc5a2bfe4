//! Download handlers: batch snapshot, batch triggering, try-counter reset.

use crate::api::AppState;
use crate::error::Error;
use crate::types::PostId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

/// GET /downloads - Current batch snapshot
///
/// Returns the trimmed progress records of the active batch in submission
/// order; an empty array when no batch has run yet.
#[utoipa::path(
    get,
    path = "/downloads",
    tag = "downloads",
    responses(
        (status = 200, description = "Trimmed progress records for the active batch", body = Vec<crate::types::TrimmedRecord>)
    )
)]
pub async fn list_downloads(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.downloader.progress_snapshot())
}

/// POST /downloads/batch - Run a download batch over every post still pending media
///
/// The batch runs in a background task; progress is observable on `/events`
/// and `/downloads`. Returns immediately.
#[utoipa::path(
    post,
    path = "/downloads/batch",
    tag = "downloads",
    responses(
        (status = 202, description = "Batch accepted and running in the background")
    )
)]
pub async fn start_batch(State(state): State<AppState>) -> impl IntoResponse {
    let downloader = state.downloader.clone();
    tokio::spawn(async move {
        match downloader.download_pending().await {
            Ok(succeeded) => {
                tracing::info!(succeeded = succeeded.len(), "download batch finished");
            }
            Err(e) => {
                tracing::error!(error = %e, "download batch failed to initialize");
            }
        }
    });

    (StatusCode::ACCEPTED, Json(json!({"status": "batch started"})))
}

/// POST /downloads/:id/reset-tries - Reset a post's try counter
///
/// Makes a post whose retry budget is exhausted eligible for future batches
/// again.
#[utoipa::path(
    post,
    path = "/downloads/{id}/reset-tries",
    tag = "downloads",
    params(
        ("id" = String, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Try counter reset"),
        (status = 404, description = "No post with this id", body = crate::api::error_response::ApiError)
    )
)]
pub async fn reset_download_tries(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Error> {
    state
        .downloader
        .db
        .reset_media_download_tries(&PostId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
