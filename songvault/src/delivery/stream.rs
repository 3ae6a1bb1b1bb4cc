//! Byte-stream delivery of a stored track.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use super::disposition::inline_disposition;
use super::range::RangeRequest;
use crate::database::models::TrackSummary;
use crate::resolver::TARGET_MIME_TYPE;

/// Cache directive for stored audio. Payloads never change once written.
pub const AUDIO_CACHE_CONTROL: &str = "public, max-age=31536000";

/// A track's metadata together with its non-empty audio payload.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub track: TrackSummary,
    pub bytes: Bytes,
}

/// Streaming response for an [`AudioPayload`], honouring a single byte range.
#[derive(Debug, Clone)]
pub struct AudioStream {
    payload: AudioPayload,
    range: RangeRequest,
}

impl AudioStream {
    /// Full-payload stream.
    pub fn new(payload: AudioPayload) -> Self {
        Self {
            payload,
            range: RangeRequest::Full,
        }
    }

    /// Apply the request's `Range` header, if any.
    pub fn with_range_header(mut self, value: Option<&str>) -> Self {
        self.range = RangeRequest::resolve(value, self.payload.bytes.len() as u64);
        self
    }

    pub fn range(&self) -> RangeRequest {
        self.range
    }

    fn base_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(TARGET_MIME_TYPE),
        );
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(AUDIO_CACHE_CONTROL),
        );
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&inline_disposition(&self.payload.track.title))
                .unwrap_or_else(|_| HeaderValue::from_static("inline")),
        );
        headers
    }
}

fn header_value(value: String) -> HeaderValue {
    // Only digits, spaces, slashes and dashes end up here.
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

impl IntoResponse for AudioStream {
    fn into_response(self) -> Response {
        let mut headers = self.base_headers();
        let total = self.payload.bytes.len() as u64;

        let (status, body) = match self.range {
            RangeRequest::Full => {
                headers.insert(header::CONTENT_LENGTH, header_value(total.to_string()));
                (StatusCode::OK, self.payload.bytes)
            }
            RangeRequest::Partial(range) => {
                // Range bounds are validated against `total`.
                let slice = self
                    .payload
                    .bytes
                    .slice(range.start as usize..=range.end as usize);
                headers.insert(
                    header::CONTENT_RANGE,
                    header_value(range.content_range(total)),
                );
                headers.insert(
                    header::CONTENT_LENGTH,
                    header_value(range.size().to_string()),
                );
                (StatusCode::PARTIAL_CONTENT, slice)
            }
            RangeRequest::Unsatisfiable => {
                headers.insert(
                    header::CONTENT_RANGE,
                    header_value(format!("bytes */{total}")),
                );
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
                (StatusCode::RANGE_NOT_SATISFIABLE, Bytes::new())
            }
        };

        (status, headers, Body::from(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn payload(bytes: &'static [u8]) -> AudioPayload {
        AudioPayload {
            track: TrackSummary {
                id: "id".to_string(),
                title: "Song".to_string(),
                artist: "Artist".to_string(),
                duration_secs: 3,
                source_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                thumbnail_url: None,
                created_at: 0,
            },
            bytes: Bytes::from_static(bytes),
        }
    }

    async fn body(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_full_stream_headers() {
        let response = AudioStream::new(payload(b"0123456789")).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(headers[header::CONTENT_LENGTH], "10");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::CACHE_CONTROL], AUDIO_CACHE_CONTROL);
        assert!(
            headers[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .starts_with("inline; filename=\"Song.mp3\"")
        );
        assert_eq!(body(response).await, Bytes::from_static(b"0123456789"));
    }

    #[tokio::test]
    async fn test_partial_stream() {
        let response = AudioStream::new(payload(b"0123456789"))
            .with_range_header(Some("bytes=2-5"))
            .into_response();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 2-5/10");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
        assert_eq!(body(response).await, Bytes::from_static(b"2345"));
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let response = AudioStream::new(payload(b"0123456789"))
            .with_range_header(Some("bytes=50-"))
            .into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */10");
        assert!(body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_range_serves_everything() {
        let stream = AudioStream::new(payload(b"abc")).with_range_header(Some("bytes=oops"));
        assert_eq!(stream.range(), RangeRequest::Full);
        let response = stream.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, Bytes::from_static(b"abc"));
    }
}
