//! External media resolution.
//!
//! The `MediaResolver` trait is the boundary to the component that inspects
//! video pages and downloads/transcodes their audio. The production
//! implementation drives the `yt-dlp` binary.

mod traits;
mod ytdlp;

pub use traits::{
    DEFAULT_BITRATE_KBPS, FetchRequest, MediaResolver, TARGET_AUDIO_CODEC, TARGET_EXTENSION,
    TARGET_MIME_TYPE, with_extension_suffix,
};
pub use ytdlp::{YtDlpConfig, YtDlpResolver};
