//! Scratch directory helpers.

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::{Error, Result};

/// Create the scratch directory if it does not exist.
pub async fn ensure_scratch_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io_path("creating scratch directory", dir, e))
}

/// Remove a file, treating failure as non-fatal.
///
/// Returns `true` when the file was removed. An already-missing file counts
/// as not removed; any other error is logged at debug level and dropped.
pub async fn remove_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Ignoring failed scratch removal");
            false
        }
    }
}

/// Remove every scratch file belonging to one work item.
///
/// Work items name all their files `<id>.<ext>` (plus resolver temporaries
/// such as `<id>.webm.part`), so a prefix match on the id catches them all.
pub async fn purge_work_item(dir: &Path, id: &str) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Cannot list scratch directory");
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Stopped listing scratch directory");
                break;
            }
        };

        let belongs = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(id));
        if belongs && remove_best_effort(&entry.path()).await {
            removed += 1;
        }
    }
    removed
}
