//! Track database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time::now_ms;
use crate::domain::{SourceUrl, TrackMetadata};

/// Track database model.
///
/// One ingested song: descriptive metadata plus the transcoded audio payload.
/// Rows are written once and never updated.
#[derive(Debug, Clone, FromRow)]
pub struct TrackDbModel {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub duration_secs: i64,
    /// The URL the audio was fetched from. Kept for provenance only.
    pub source_url: String,
    /// Display-only thumbnail URL; never fetched by this service.
    pub thumbnail_url: Option<String>,
    /// Encoded audio. `None` or empty only for a corrupt row.
    pub payload: Option<Vec<u8>>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl TrackDbModel {
    /// Build a new row stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        metadata: &TrackMetadata,
        source_url: &SourceUrl,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            title: metadata.title.clone(),
            artist: metadata.artist.clone(),
            duration_secs: i64::from(metadata.duration_secs),
            source_url: source_url.as_str().to_string(),
            thumbnail_url: Some(metadata.thumbnail.clone()).filter(|t| !t.is_empty()),
            payload: Some(payload),
            created_at: now_ms(),
        }
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at_ms: i64) -> Self {
        self.created_at = created_at_ms;
        self
    }

    /// Whether the row carries usable audio.
    pub fn has_payload(&self) -> bool {
        self.payload.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Metadata-only view of this row.
    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            duration_secs: self.duration_secs,
            source_url: self.source_url.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Track row without the payload column.
///
/// Listing and lookups use this so audio blobs are only read when delivered.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub duration_secs: i64,
    pub source_url: String,
    pub thumbnail_url: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> TrackMetadata {
        TrackMetadata {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            duration_secs: 200,
            thumbnail: String::new(),
        }
    }

    #[test]
    fn test_new_track() {
        let url = SourceUrl::from_trusted("https://youtu.be/dQw4w9WgXcQ");
        let track = TrackDbModel::new("id-1", &metadata(), &url, vec![1, 2, 3]);
        assert_eq!(track.duration_secs, 200);
        assert_eq!(track.thumbnail_url, None);
        assert!(track.has_payload());
        assert!(track.created_at > 0);
    }

    #[test]
    fn test_empty_payload_is_not_usable() {
        let url = SourceUrl::from_trusted("https://youtu.be/dQw4w9WgXcQ");
        let mut track = TrackDbModel::new("id-1", &metadata(), &url, Vec::new());
        assert!(!track.has_payload());
        track.payload = None;
        assert!(!track.has_payload());
    }

    #[test]
    fn test_summary_drops_payload() {
        let url = SourceUrl::from_trusted("https://youtu.be/dQw4w9WgXcQ");
        let track = TrackDbModel::new("id-1", &metadata(), &url, vec![9]).with_created_at(42);
        let summary = track.summary();
        assert_eq!(summary.id, "id-1");
        assert_eq!(summary.created_at, 42);
    }
}
