//! Source URL value object.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Recognised video reference shapes: watch pages, short links, embeds,
/// `/v/` and `/shorts/` paths, and any path carrying a `?v=` parameter,
/// ending in an 11-character video id. Scheme and subdomain are optional.
pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:(?:www|m|music)\.)?(?:youtube|youtu|youtube-nocookie)\.(?:com|be)/(?:watch\?v=|embed/|v/|shorts/|.+\?v=)?([^&=%?/#\s]{11})",
    )
    .expect("source URL regex is valid")
});

/// Returns true iff `url` structurally looks like a supported video reference.
///
/// Purely syntactic: no network access. A URL that passes may still fail to
/// resolve later.
pub fn is_valid_source_url(url: &str) -> bool {
    URL_REGEX.is_match(url)
}

/// A validated source URL.
///
/// Construction trims surrounding whitespace and rejects empty or
/// unrecognised input, so holding a `SourceUrl` means validation already ran.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceUrl(String);

impl SourceUrl {
    /// Validate and wrap a URL.
    pub fn parse(url: impl AsRef<str>) -> Result<Self, Error> {
        let url = url.as_ref().trim();
        if url.is_empty() {
            return Err(Error::validation("Please provide a YouTube URL"));
        }
        if !is_valid_source_url(url) {
            return Err(Error::validation("Invalid YouTube URL format"));
        }
        Ok(Self(url.to_string()))
    }

    /// Wrap a URL without validation (for trusted sources like the DB).
    pub fn from_trusted(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SourceUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SourceUrl> for String {
    fn from(url: SourceUrl) -> Self {
        url.0
    }
}
