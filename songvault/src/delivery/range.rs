//! Single byte-range parsing for `Range: bytes=...` request headers.

use std::fmt;

/// Inclusive byte range within a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte (inclusive).
    pub start: u64,
    /// Last byte (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this range within `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-{}", self.start, self.end)
    }
}

/// How a request's `Range` header applies to a payload of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No header, or one we do not serve partially (malformed, multi-range,
    /// non-byte unit). Serve the whole payload.
    Full,
    /// One satisfiable range.
    Partial(ByteRange),
    /// Syntactically valid but outside the payload.
    Unsatisfiable,
}

impl RangeRequest {
    /// Resolve an optional `Range` header against a payload of `total` bytes.
    pub fn resolve(header: Option<&str>, total: u64) -> Self {
        match header {
            Some(value) => parse_range_header(value, total),
            None => Self::Full,
        }
    }
}

/// Parse a `Range` header value for a payload of `total` bytes.
///
/// Supports `bytes=a-b`, `bytes=a-` and `bytes=-n`. Ranges covering the whole
/// payload collapse to [`RangeRequest::Full`].
pub fn parse_range_header(value: &str, total: u64) -> RangeRequest {
    let Some(spec) = value.trim().strip_prefix("bytes=") else {
        return RangeRequest::Full;
    };
    if spec.contains(',') {
        return RangeRequest::Full;
    }
    let Some((first, last)) = spec.trim().split_once('-') else {
        return RangeRequest::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    let range = match (first.is_empty(), last.is_empty()) {
        // bytes=-n
        (true, false) => {
            let Ok(suffix) = last.parse::<u64>() else {
                return RangeRequest::Full;
            };
            if suffix == 0 || total == 0 {
                return RangeRequest::Unsatisfiable;
            }
            ByteRange {
                start: total.saturating_sub(suffix),
                end: total - 1,
            }
        }
        // bytes=a-
        (false, true) => {
            let Ok(start) = first.parse::<u64>() else {
                return RangeRequest::Full;
            };
            if start >= total {
                return RangeRequest::Unsatisfiable;
            }
            ByteRange {
                start,
                end: total - 1,
            }
        }
        // bytes=a-b
        (false, false) => {
            let (Ok(start), Ok(end)) = (first.parse::<u64>(), last.parse::<u64>()) else {
                return RangeRequest::Full;
            };
            if end < start {
                return RangeRequest::Full;
            }
            if start >= total {
                return RangeRequest::Unsatisfiable;
            }
            ByteRange {
                start,
                end: end.min(total - 1),
            }
        }
        (true, true) => return RangeRequest::Full,
    };

    if range.start == 0 && range.end == total - 1 {
        RangeRequest::Full
    } else {
        RangeRequest::Partial(range)
    }
}
