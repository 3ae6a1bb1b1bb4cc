//! Read/delete access to stored tracks.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::database::models::TrackSummary;
use crate::database::repositories::TrackRepository;
use crate::delivery::{AudioPayload, EncodedTrack};
use crate::{Error, Result};

/// Library of stored tracks.
///
/// A track whose payload is missing or empty is reported as not found, the
/// same as an unknown id.
#[derive(Clone)]
pub struct TrackLibrary {
    tracks: Arc<dyn TrackRepository>,
}

impl TrackLibrary {
    pub fn new(tracks: Arc<dyn TrackRepository>) -> Self {
        Self { tracks }
    }

    /// All tracks, newest first.
    pub async fn list(&self) -> Result<Vec<TrackSummary>> {
        self.tracks.list().await
    }

    pub async fn get(&self, id: &str) -> Result<TrackSummary> {
        self.tracks.get(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.tracks.delete(id).await?;
        info!(id = %id, "Track deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        self.tracks.count().await
    }

    /// Load a track with its audio for streaming.
    pub async fn audio(&self, id: &str) -> Result<AudioPayload> {
        let track = self.tracks.get(id).await?;
        let payload = self.tracks.get_payload(id).await?;

        match payload {
            Some(bytes) if !bytes.is_empty() => {
                debug!(id = %id, bytes = bytes.len(), "Loaded track audio");
                Ok(AudioPayload {
                    track,
                    bytes: Bytes::from(bytes),
                })
            }
            _ => {
                warn!(id = %id, "Track has no audio payload");
                Err(Error::not_found("Track audio", id))
            }
        }
    }

    /// Load a track with its audio inlined as base64.
    pub async fn encoded(&self, id: &str) -> Result<EncodedTrack> {
        self.audio(id).await.map(EncodedTrack::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::TrackDbModel;
    use crate::database::repositories::SqlxTrackRepository;
    use crate::database::test_support::migrated_pool;
    use crate::domain::{SourceUrl, TrackMetadata};

    #[tokio::test]
    async fn test_audio_and_encoded_match() {
        let (pool, _dir) = migrated_pool().await;
        let repo = Arc::new(SqlxTrackRepository::new(pool));
        let track = TrackDbModel::new(
            "t1",
            &TrackMetadata::default(),
            &SourceUrl::from_trusted("https://youtu.be/dQw4w9WgXcQ"),
            vec![1, 2, 3, 250],
        );
        repo.put(&track).await.unwrap();

        let library = TrackLibrary::new(repo);
        let audio = library.audio("t1").await.unwrap();
        let encoded = library.encoded("t1").await.unwrap();

        assert_eq!(audio.bytes.as_ref(), &[1, 2, 3, 250]);
        assert_eq!(encoded.decode_audio().unwrap(), audio.bytes.to_vec());
        assert_eq!(encoded.track, audio.track);
    }

    #[tokio::test]
    async fn test_row_without_payload_is_not_found() {
        let (pool, _dir) = migrated_pool().await;
        sqlx::query(
            "INSERT INTO tracks (id, title, artist, duration_secs, source_url, payload, created_at) \
             VALUES ('broken', 't', 'a', 0, 'u', NULL, 1)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let library = TrackLibrary::new(Arc::new(SqlxTrackRepository::new(pool)));
        assert!(library.get("broken").await.is_ok());
        assert!(library.audio("broken").await.unwrap_err().is_not_found());
        assert!(library.encoded("broken").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let (pool, _dir) = migrated_pool().await;
        let library = TrackLibrary::new(Arc::new(SqlxTrackRepository::new(pool)));
        let id = uuid::Uuid::new_v4().to_string();

        assert!(library.get(&id).await.unwrap_err().is_not_found());
        assert!(library.audio(&id).await.unwrap_err().is_not_found());
        assert!(library.encoded(&id).await.unwrap_err().is_not_found());
        assert!(library.delete(&id).await.unwrap_err().is_not_found());
    }
}
