//! Extraction and ingestion routes.
//!
//! Both endpoints answer with HTTP 200 and report pipeline failures in-band,
//! so the front-end can show which step failed.

use axum::{Json, Router, extract::State, routing::post};
use tracing::debug;

use crate::api::error::ApiResult;
use crate::api::models::{
    DownloadRequest, DownloadResponse, ExtractRequest, ExtractResponse, failure_message,
};
use crate::api::server::AppState;
use crate::ingest::IngestRequest;

/// Create the ingestion router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/extract", post(extract_info))
        .route("/download", post(download_song))
}

/// `POST /api/extract`: resolve metadata without storing anything.
pub async fn extract_info(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> ApiResult<Json<ExtractResponse>> {
    let response = match state.ingest.extract(&request.url).await {
        Ok(info) => ExtractResponse::from(info),
        Err(e) => {
            debug!(url = %request.url, error = %e, "Extraction failed");
            ExtractResponse::failure(failure_message(&e, "Extraction"))
        }
    };
    Ok(Json(response))
}

/// `POST /api/download`: fetch, transcode and store a confirmed track.
pub async fn download_song(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> ApiResult<Json<DownloadResponse>> {
    let metadata = request.metadata();
    let response = match state
        .ingest
        .ingest(IngestRequest::new(request.url, metadata))
        .await
    {
        Ok(track) => DownloadResponse::stored(track),
        Err(e) => DownloadResponse::failure(failure_message(&e, "Download")),
    };
    Ok(Json(response))
}
