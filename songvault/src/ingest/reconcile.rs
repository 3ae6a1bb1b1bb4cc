//! Locate the transcoder output for a work item.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::resolver::{TARGET_EXTENSION, with_extension_suffix};
use crate::{Error, Result};

/// Extensions probed, in order, when the expected output is missing.
pub const ALTERNATE_EXTENSIONS: [&str; 4] = ["webm", "m4a", "opus", "ogg"];

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|m| m.is_file())
}

/// Return the path of the produced audio file for `stem`.
///
/// The expected `<stem>.mp3` wins. Otherwise the first alternate found is
/// renamed to the expected path. If nothing exists the conversion failed.
pub async fn reconcile_output(stem: &Path) -> Result<PathBuf> {
    let expected = with_extension_suffix(stem, TARGET_EXTENSION);
    if is_file(&expected).await {
        return Ok(expected);
    }

    for ext in ALTERNATE_EXTENSIONS {
        let candidate = with_extension_suffix(stem, ext);
        if !is_file(&candidate).await {
            continue;
        }

        tokio::fs::rename(&candidate, &expected)
            .await
            .map_err(|e| Error::io_path("renaming transcoder output", &candidate, e))?;
        warn!(
            from = %candidate.display(),
            to = %expected.display(),
            "Transcoder left a non-{} file; using it as-is",
            TARGET_EXTENSION
        );
        return Ok(expected);
    }

    Err(Error::ConversionFailed {
        stem: stem.display().to_string(),
    })
}
