//! Self-contained base64 delivery of a stored track.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use super::stream::AudioPayload;
use crate::database::models::TrackSummary;
use crate::{Error, Result};

/// A track with its audio inlined as standard base64.
#[derive(Debug, Clone, Serialize)]
pub struct EncodedTrack {
    pub audio: String,
    pub track: TrackSummary,
}

impl EncodedTrack {
    /// Decode the inlined audio back into raw bytes.
    pub fn decode_audio(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.audio)
            .map_err(|e| Error::Other(format!("invalid base64 audio: {e}")))
    }
}

impl From<AudioPayload> for EncodedTrack {
    fn from(payload: AudioPayload) -> Self {
        Self {
            audio: STANDARD.encode(&payload.bytes),
            track: payload.track,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_encoded_track_uses_standard_alphabet() {
        let payload = AudioPayload {
            track: TrackSummary {
                id: "id".to_string(),
                title: "t".to_string(),
                artist: "a".to_string(),
                duration_secs: 0,
                source_url: String::new(),
                thumbnail_url: None,
                created_at: 0,
            },
            bytes: Bytes::from_static(&[0xFB, 0xFF, 0xBF]),
        };

        let encoded = EncodedTrack::from(payload.clone());
        assert_eq!(encoded.audio, "+/+/");
        assert_eq!(encoded.decode_audio().unwrap(), payload.bytes.to_vec());
    }
}
