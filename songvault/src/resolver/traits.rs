//! Media resolver trait and related types.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;
use crate::domain::{RawMetadata, SourceUrl};

/// Codec name passed to the transcoder.
pub const TARGET_AUDIO_CODEC: &str = "mp3";

/// Extension the transcoder is expected to produce.
pub const TARGET_EXTENSION: &str = "mp3";

/// MIME type of the stored payload.
pub const TARGET_MIME_TYPE: &str = "audio/mpeg";

/// Default target bitrate in kbit/s.
pub const DEFAULT_BITRATE_KBPS: u32 = 192;

/// Request for a combined download + transcode.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Validated source URL.
    pub url: SourceUrl,
    /// Output path without extension. The resolver appends whichever
    /// extension it ends up producing.
    pub output_stem: PathBuf,
    /// Target bitrate in kbit/s.
    pub bitrate_kbps: u32,
    /// Deadline for the whole download + transcode, `None` for no limit.
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn new(url: SourceUrl, output_stem: impl Into<PathBuf>) -> Self {
        Self {
            url,
            output_stem: output_stem.into(),
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            timeout: None,
        }
    }

    /// Set the target bitrate.
    pub fn with_bitrate(mut self, kbps: u32) -> Self {
        self.bitrate_kbps = kbps;
        self
    }

    /// Set the fetch deadline.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }
}

/// Append `.ext` to a path without touching any dot already in the file name.
pub fn with_extension_suffix(stem: &Path, ext: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// External capability that inspects source URLs and fetches their audio.
///
/// Implementations report every failure (unsupported URL, network error,
/// missing audio stream, missing transcoder) as an `Err` with a readable
/// message. A fetch that exceeds `request.timeout` returns `Error::Timeout`
/// only after every process it started has exited, so nothing writes to the
/// scratch directory afterwards. Dropping a returned future must kill those
/// processes as well.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolver name for logs.
    fn name(&self) -> &'static str;

    /// Resolve metadata without downloading media.
    ///
    /// `Ok(None)` means the resolver ran but produced no usable result.
    async fn inspect(&self, url: &SourceUrl) -> Result<Option<RawMetadata>>;

    /// Download the best audio stream and transcode it next to
    /// `request.output_stem`.
    async fn fetch_audio(&self, request: &FetchRequest) -> Result<()>;

    /// Resolver version, `None` when the backend is unavailable.
    async fn version(&self) -> Option<String>;

    /// Whether the backend can be invoked at all.
    async fn is_available(&self) -> bool {
        self.version().await.is_some()
    }
}
