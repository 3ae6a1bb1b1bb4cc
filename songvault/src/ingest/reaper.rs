//! Stale scratch file reaper.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use super::scratch::remove_best_effort;

/// Files older than this are considered abandoned.
pub const DEFAULT_SCRATCH_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Outcome of one reaper pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReapReport {
    /// Regular files inspected.
    pub scanned: usize,
    /// Files removed.
    pub removed: usize,
    /// Files that were old enough but could not be removed, or whose
    /// metadata could not be read.
    pub skipped: usize,
}

/// Deletes scratch files whose modification time exceeds `max_age`.
///
/// Reaping is best-effort: it never fails, and individual errors only show up
/// in the returned report.
#[derive(Debug, Clone)]
pub struct ScratchReaper {
    dir: PathBuf,
    max_age: Duration,
}

impl ScratchReaper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    /// Reap relative to the current time.
    pub async fn reap(&self) -> ReapReport {
        self.reap_at(SystemTime::now()).await
    }

    /// Reap relative to `now`.
    pub async fn reap_at(&self, now: SystemTime) -> ReapReport {
        let mut report = ReapReport::default();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "Scratch directory not readable, skipping reap");
                return report;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(_) => {
                    report.skipped += 1;
                    continue;
                }
            };
            report.scanned += 1;

            let Ok(modified) = metadata.modified() else {
                report.skipped += 1;
                continue;
            };

            // A modification time in the future counts as fresh.
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= self.max_age {
                continue;
            }

            let path = entry.path();
            if remove_best_effort(&path).await {
                debug!(path = %path.display(), age_secs = age.as_secs(), "Removed stale scratch file");
                report.removed += 1;
            } else {
                report.skipped += 1;
            }
        }

        if report.removed > 0 {
            info!(
                dir = %self.dir.display(),
                removed = report.removed,
                skipped = report.skipped,
                "Reaped stale scratch files"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(path: &Path, age: Duration) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_removes_only_stale_files() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("stale.mp3");
        let fresh = dir.path().join("fresh.mp3");
        touch(&stale, Duration::from_secs(2 * 60 * 60));
        touch(&fresh, Duration::from_secs(10 * 60));

        let reaper = ScratchReaper::new(dir.path(), DEFAULT_SCRATCH_MAX_AGE);
        let report = reaper.reap().await;

        assert_eq!(report.scanned, 2);
        assert_eq!(report.removed, 1);
        assert!(!stale.exists());
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn test_subdirectories_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let reaper = ScratchReaper::new(dir.path(), Duration::ZERO);
        let report = reaper
            .reap_at(SystemTime::now() + Duration::from_secs(60))
            .await;

        assert_eq!(report, ReapReport::default());
        assert!(dir.path().join("nested").is_dir());
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let reaper = ScratchReaper::new(dir.path().join("missing"), DEFAULT_SCRATCH_MAX_AGE);
        assert_eq!(reaper.reap().await, ReapReport::default());
    }

    #[tokio::test]
    async fn test_reap_at_uses_given_clock() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.webm");
        touch(&file, Duration::ZERO);

        let reaper = ScratchReaper::new(dir.path(), DEFAULT_SCRATCH_MAX_AGE);
        let later = SystemTime::now() + Duration::from_secs(2 * 60 * 60);
        assert_eq!(reaper.reap_at(later).await.removed, 1);
        assert!(!file.exists());
    }
}
