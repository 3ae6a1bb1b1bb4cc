//! API request and response models (DTOs).
//!
//! Every JSON response carries a `success` flag. Extraction and ingestion
//! failures are reported in-band (`success: false` plus `error`) with HTTP 200,
//! lookups of unknown songs use [`ApiError`](super::error::ApiError) with 404.

use serde::{Deserialize, Serialize};

use crate::database::models::TrackSummary;
use crate::database::time::ms_to_rfc3339;
use crate::delivery::EncodedTrack;
use crate::domain::{ExtractedInfo, TrackMetadata};
use crate::error::Error;

// ============================================================================
// Extraction
// ============================================================================

/// Request body for `POST /api/extract`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub url: String,
}

/// Response body for `POST /api/extract`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            title: None,
            artist: None,
            duration: None,
            thumbnail: None,
            url: None,
            error: Some(message.into()),
        }
    }
}

impl From<ExtractedInfo> for ExtractResponse {
    fn from(info: ExtractedInfo) -> Self {
        Self {
            success: true,
            title: Some(info.metadata.title),
            artist: Some(info.metadata.artist),
            duration: Some(info.metadata.duration_secs),
            thumbnail: Some(info.metadata.thumbnail),
            url: Some(info.source_url.into()),
            error: None,
        }
    }
}

// ============================================================================
// Ingestion
// ============================================================================

/// Request body for `POST /api/download`.
///
/// Metadata fields echo a prior extraction; missing or blank values fall back
/// to placeholders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Seconds; fractional values are rounded, negatives become 0.
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
}

impl DownloadRequest {
    /// Confirmed metadata carried by the request.
    pub fn metadata(&self) -> TrackMetadata {
        let duration = self
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.round().min(f64::from(u32::MAX)) as u32);
        TrackMetadata::from_fields(
            self.title.clone(),
            self.artist.clone(),
            duration,
            self.thumbnail.clone(),
        )
    }
}

/// Response body for `POST /api/download`.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<SongResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadResponse {
    pub fn stored(track: TrackSummary) -> Self {
        Self {
            success: true,
            song: Some(track.into()),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            song: None,
            error: Some(message.into()),
        }
    }
}

/// Message shown to the client for a failed extraction or ingestion.
///
/// Validation messages are shown verbatim; other failures are prefixed with
/// the step that failed unless the error already names it.
pub fn failure_message(err: &Error, step: &str) -> String {
    match err {
        Error::Validation(msg) => msg.clone(),
        Error::Resolution(_)
        | Error::NoMetadata
        | Error::Fetch(_)
        | Error::ConversionFailed { .. }
        | Error::Timeout { .. } => err.to_string(),
        other => format!("{step} failed: {other}"),
    }
}

// ============================================================================
// Songs
// ============================================================================

/// Public representation of a stored song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongResponse {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub duration: i64,
    pub youtube_url: String,
    pub thumbnail_url: Option<String>,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<TrackSummary> for SongResponse {
    fn from(track: TrackSummary) -> Self {
        Self {
            created_at: ms_to_rfc3339(track.created_at),
            id: track.id,
            title: track.title,
            artist: track.artist,
            duration: track.duration_secs,
            youtube_url: track.source_url,
            thumbnail_url: track.thumbnail_url,
        }
    }
}

/// Response body for `GET /api/songs`.
#[derive(Debug, Clone, Serialize)]
pub struct SongsResponse {
    pub success: bool,
    pub songs: Vec<SongResponse>,
}

/// Response body for `GET /api/songs/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SongEnvelope {
    pub success: bool,
    pub song: SongResponse,
}

/// Response body for `GET /api/songs/{id}/blob`.
#[derive(Debug, Clone, Serialize)]
pub struct BlobResponse {
    pub success: bool,
    /// Standard base64 of the audio payload.
    pub audio: String,
    pub song: SongResponse,
}

impl From<EncodedTrack> for BlobResponse {
    fn from(encoded: EncodedTrack) -> Self {
        Self {
            success: true,
            audio: encoded.audio,
            song: encoded.track.into(),
        }
    }
}

/// Response body for `DELETE /api/songs/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub components: Vec<ComponentHealth>,
}

/// Component health status.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
}

// ============================================================================
// Logging
// ============================================================================

/// Current log filter.
#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfigResponse {
    pub filter: String,
}

/// Request body for `PUT /api/logging`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLogFilterRequest {
    pub filter: String,
}
