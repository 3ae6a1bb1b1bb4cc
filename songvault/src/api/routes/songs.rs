//! Stored song routes: listing, lookup, deletion and audio delivery.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, header},
    routing::get,
};

use crate::api::error::ApiResult;
use crate::api::models::{BlobResponse, DeleteResponse, SongEnvelope, SongResponse, SongsResponse};
use crate::api::server::AppState;
use crate::delivery::AudioStream;

/// Create the songs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_songs))
        .route("/{id}", get(get_song).delete(delete_song))
        .route("/{id}/audio", get(stream_audio))
        .route("/{id}/blob", get(get_audio_blob))
}

/// `GET /api/songs`: all songs, newest first.
pub async fn list_songs(State(state): State<AppState>) -> ApiResult<Json<SongsResponse>> {
    let songs = state
        .library
        .list()
        .await?
        .into_iter()
        .map(SongResponse::from)
        .collect();
    Ok(Json(SongsResponse {
        success: true,
        songs,
    }))
}

/// `GET /api/songs/{id}`
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SongEnvelope>> {
    let track = state.library.get(&id).await?;
    Ok(Json(SongEnvelope {
        success: true,
        song: track.into(),
    }))
}

/// `DELETE /api/songs/{id}`
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.library.delete(&id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// `GET /api/songs/{id}/audio`: raw audio, honouring a single `Range`.
pub async fn stream_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<AudioStream> {
    let payload = state.library.audio(&id).await?;
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());
    Ok(AudioStream::new(payload).with_range_header(range))
}

/// `GET /api/songs/{id}/blob`: audio inlined as base64 with the song.
pub async fn get_audio_blob(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BlobResponse>> {
    let encoded = state.library.encoded(&id).await?;
    Ok(Json(encoded.into()))
}
