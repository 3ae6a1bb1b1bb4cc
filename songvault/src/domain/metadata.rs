//! Normalised track metadata.
//!
//! The resolver hands back a loosely-typed JSON object. [`TrackMetadata::from_raw`]
//! is the only place that reads it; everything downstream works with the typed
//! structure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SourceUrl;

/// Placeholder title when the source provides none.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Placeholder artist when the source provides none.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Raw resolver output.
pub type RawMetadata = Map<String, Value>;

/// Descriptive metadata for a track, as confirmed by the client before ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub duration_secs: u32,
    /// Thumbnail URL, empty when the source has none.
    pub thumbnail: String,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            duration_secs: 0,
            thumbnail: String::new(),
        }
    }
}

impl TrackMetadata {
    /// Build metadata from client-supplied fields, applying placeholders for
    /// blank values.
    pub fn from_fields(
        title: Option<String>,
        artist: Option<String>,
        duration_secs: Option<u32>,
        thumbnail: Option<String>,
    ) -> Self {
        Self {
            title: non_blank(title).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            artist: non_blank(artist).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            duration_secs: duration_secs.unwrap_or(0),
            thumbnail: thumbnail.map(|t| t.trim().to_string()).unwrap_or_default(),
        }
    }

    /// Normalise a raw resolver response.
    ///
    /// - `title` falls back to [`UNKNOWN_TITLE`].
    /// - `artist` reads `uploader`, then `channel`, then [`UNKNOWN_ARTIST`].
    /// - `duration` accepts integer or float seconds; negatives and missing values are 0.
    /// - `thumbnail` prefers `thumbnail`, then the last entry of `thumbnails`
    ///   carrying a `url`, then the empty string.
    pub fn from_raw(raw: &RawMetadata) -> Self {
        let title = string_field(raw, "title").unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let artist = string_field(raw, "uploader")
            .or_else(|| string_field(raw, "channel"))
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let duration_secs = raw.get("duration").map(duration_secs).unwrap_or(0);
        let thumbnail = string_field(raw, "thumbnail")
            .or_else(|| last_thumbnail(raw))
            .unwrap_or_default();

        Self {
            title,
            artist,
            duration_secs,
            thumbnail,
        }
    }
}

/// Result of a metadata-only inspection, echoed back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedInfo {
    pub metadata: TrackMetadata,
    pub source_url: SourceUrl,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn string_field(raw: &RawMetadata, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn duration_secs(value: &Value) -> u32 {
    if let Some(secs) = value.as_u64() {
        return u32::try_from(secs).unwrap_or(u32::MAX);
    }
    match value.as_f64() {
        Some(secs) if secs.is_finite() && secs > 0.0 => secs.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn last_thumbnail(raw: &RawMetadata) -> Option<String> {
    raw.get("thumbnails")?
        .as_array()?
        .iter()
        .rev()
        .find_map(|entry| entry.get("url").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
