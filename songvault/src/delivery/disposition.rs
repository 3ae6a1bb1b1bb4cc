//! `Content-Disposition` values for delivered tracks.

use crate::resolver::TARGET_EXTENSION;

/// Characters that are never allowed in a suggested filename.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', ';'];

/// Sanitize a track title for use as a download filename stem.
///
/// Control characters and path/quote characters become `_` (runs collapse to
/// one), surrounding spaces and dots are trimmed, and an empty result becomes
/// `"audio"`. Unicode is preserved.
pub fn sanitize_title(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut last_was_replacement = false;

    for c in title.chars() {
        if c.is_control() || INVALID_CHARS.contains(&c) {
            if !last_was_replacement {
                result.push('_');
                last_was_replacement = true;
            }
        } else {
            result.push(c);
            last_was_replacement = false;
        }
    }

    let trimmed = result.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.is_empty() {
        "audio".to_string()
    } else {
        trimmed.to_string()
    }
}

/// ASCII-only variant of a sanitized stem, for the legacy `filename` parameter.
fn ascii_fallback(stem: &str) -> String {
    let mut result = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_graphic() || c == ' ' {
            result.push(c);
        } else if !result.ends_with('_') {
            result.push('_');
        }
    }

    let trimmed = result.trim_matches(|c| c == ' ' || c == '_');
    if trimmed.is_empty() {
        "audio".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build an `inline` disposition naming the file after `title`.
///
/// Both the ASCII `filename` and the RFC 5987 `filename*` forms are emitted
/// so non-ASCII titles survive in clients that understand the latter.
pub fn inline_disposition(title: &str) -> String {
    let stem = sanitize_title(title);
    format!(
        "inline; filename=\"{}.{ext}\"; filename*=UTF-8''{}.{ext}",
        ascii_fallback(&stem),
        urlencoding::encode(&stem),
        ext = TARGET_EXTENSION,
    )
}
