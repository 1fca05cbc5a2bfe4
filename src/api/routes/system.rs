//! System handlers: health, OpenAPI, events.

use crate::api::AppState;
use crate::types::Event;
use axum::{
    Json,
    extract::State,
    http::header,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream of download lifecycle updates
///
/// On attach the first frame is always `page-load`, carrying the full trimmed
/// snapshot of the active batch, so a freshly loaded page renders current state
/// before live frames arrive. Disconnecting drops the broadcast receiver; no
/// listener outlives its connection.
#[utoipa::path(
    get,
    path = "/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(State(state): State<AppState>) -> impl IntoResponse {
    // Snapshot before subscribing would lose events between the two; subscribe
    // first so anything emitted mid-attach is also delivered live
    let receiver = state.downloader.subscribe();
    let snapshot = state.downloader.progress_snapshot();

    let page_load = tokio_stream::once(Ok::<SseEvent, Infallible>(
        SseEvent::default()
            .event("page-load")
            .data(json!(snapshot).to_string()),
    ));

    let live = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => {
            let (name, payload) = wire_frame(&event);
            Some(Ok(SseEvent::default().event(name).data(payload.to_string())))
        }
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE client lagged, skipped events");
            Some(Ok(SseEvent::default().event("error").data(format!(
                r#"{{"error":"lagged","skipped":{}}}"#,
                skipped
            ))))
        }
    });

    let sse = Sse::new(page_load.chain(live)).keep_alive(KeepAlive::default());

    ([(header::CACHE_CONTROL, "no-cache")], sse)
}

/// Map a lifecycle event to its wire name and payload
///
/// Wire names are kebab-case and payload keys camelCase; both are consumed by
/// the mirror's page script and must stay stable.
pub(crate) fn wire_frame(event: &Event) -> (&'static str, serde_json::Value) {
    match event {
        // Same bare-array shape as the page-load frame: the page script feeds
        // both through one render path
        Event::NewDownloadBatchStarted { downloads } => {
            ("new-download-batch-started", json!(downloads))
        }
        Event::DownloadsCleared => ("downloads-cleared", json!(null)),
        Event::DownloadMediaTryIncrement { post_id } => (
            "download-media-try-increment",
            json!({ "postId": post_id }),
        ),
        Event::DownloadStarted { post_id } => ("download-started", json!({ "postId": post_id })),
        Event::DownloadProgress {
            post_id,
            download_file_size,
            downloaded_bytes,
            download_speed,
            download_progress,
        } => (
            "download-progress",
            json!({
                "postId": post_id,
                "downloadFileSize": download_file_size,
                "downloadedBytes": downloaded_bytes,
                "downloadSpeed": download_speed,
                "downloadProgress": download_progress,
            }),
        ),
        Event::DownloadSucceeded { post_id } => {
            ("download-succeeded", json!({ "postId": post_id }))
        }
        Event::DownloadFailed { post_id, err } => (
            "download-failed",
            json!({ "postId": post_id, "err": err }),
        ),
        Event::DownloadCancelled { post_id, reason } => (
            "download-cancelled",
            json!({ "postId": post_id, "reason": reason }),
        ),
        Event::DownloadSkipped { post_id, reason } => (
            "download-skipped",
            json!({ "postId": post_id, "reason": reason }),
        ),
    }
}
