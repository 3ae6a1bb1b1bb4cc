//! Ingestion service.
//!
//! Drives one ingestion from a confirmed URL to a stored track:
//! validate, reap, fetch + transcode, reconcile, read, persist, clean up.
//! Every step returns a `Result`; the first failure short-circuits and the
//! scratch files of the work item are removed regardless of outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::reaper::{DEFAULT_SCRATCH_MAX_AGE, ScratchReaper};
use super::reconcile::reconcile_output;
use super::scratch::{purge_work_item, remove_best_effort};
use crate::database::models::{TrackDbModel, TrackSummary};
use crate::database::repositories::TrackRepository;
use crate::domain::{ExtractedInfo, SourceUrl, TrackMetadata};
use crate::resolver::{DEFAULT_BITRATE_KBPS, FetchRequest, MediaResolver};
use crate::{Error, Result};

/// Default deadline for a metadata inspection.
pub const DEFAULT_INSPECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default deadline for a download + transcode.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Extra time a resolver gets past the fetch deadline to kill and reap its
/// processes before the call is abandoned.
const RESOLVER_GRACE: Duration = Duration::from_secs(10);

/// Message for any URL that fails validation before an ingestion.
const INVALID_URL_MESSAGE: &str = "Invalid YouTube URL";

/// Ingestion settings.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Scratch directory for work items. Must exist.
    pub scratch_dir: PathBuf,
    /// Age after which scratch files are reaped.
    pub scratch_max_age: Duration,
    pub inspect_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Target bitrate in kbit/s.
    pub bitrate_kbps: u32,
}

impl IngestConfig {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            scratch_max_age: DEFAULT_SCRATCH_MAX_AGE,
            inspect_timeout: DEFAULT_INSPECT_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
        }
    }
}

/// A confirmed ingestion request.
///
/// Metadata is supplied by the client (usually echoed from a prior
/// extraction) rather than resolved again.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub url: String,
    pub metadata: TrackMetadata,
}

impl IngestRequest {
    pub fn new(url: impl Into<String>, metadata: TrackMetadata) -> Self {
        Self {
            url: url.into(),
            metadata,
        }
    }
}

/// Ingestion orchestrator.
pub struct IngestService {
    resolver: Arc<dyn MediaResolver>,
    tracks: Arc<dyn TrackRepository>,
    reaper: ScratchReaper,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(
        resolver: Arc<dyn MediaResolver>,
        tracks: Arc<dyn TrackRepository>,
        config: IngestConfig,
    ) -> Self {
        let reaper = ScratchReaper::new(&config.scratch_dir, config.scratch_max_age);
        Self {
            resolver,
            tracks,
            reaper,
            config,
        }
    }

    /// Resolve metadata for a URL without downloading or persisting anything.
    pub async fn extract(&self, url: &str) -> Result<ExtractedInfo> {
        let url = SourceUrl::parse(url)?;
        debug!(url = %url, resolver = self.resolver.name(), "Extracting metadata");

        let raw = match timeout(self.config.inspect_timeout, self.resolver.inspect(&url)).await {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => return Err(Error::NoMetadata),
            Ok(Err(e)) => return Err(as_resolution_error(e)),
            Err(_) => {
                return Err(Error::timeout(
                    "Metadata extraction",
                    self.config.inspect_timeout,
                ));
            }
        };

        Ok(ExtractedInfo {
            metadata: TrackMetadata::from_raw(&raw),
            source_url: url,
        })
    }

    /// Run the full ingestion pipeline and return the stored track.
    ///
    /// Validation happens before any filesystem or resolver work. On failure
    /// no track is stored and the work item's scratch files are removed.
    pub async fn ingest(&self, request: IngestRequest) -> Result<TrackSummary> {
        let url = SourceUrl::parse(&request.url)
            .map_err(|_| Error::validation(INVALID_URL_MESSAGE))?;

        self.reaper.reap().await;

        let id = Uuid::new_v4().to_string();
        let stem = self.config.scratch_dir.join(&id);
        info!(id = %id, url = %url, "Starting ingestion");

        let outcome = self
            .fetch_and_store(&id, &stem, url, &request.metadata)
            .await;

        let purged = purge_work_item(&self.config.scratch_dir, &id).await;
        if purged > 0 {
            debug!(id = %id, files = purged, "Removed leftover scratch files");
        }

        match &outcome {
            Ok(track) => info!(id = %track.id, title = %track.title, "Ingestion completed"),
            Err(e) => warn!(id = %id, error = %e, "Ingestion failed"),
        }
        outcome
    }

    async fn fetch_and_store(
        &self,
        id: &str,
        stem: &Path,
        url: SourceUrl,
        metadata: &TrackMetadata,
    ) -> Result<TrackSummary> {
        let limit = self.config.fetch_timeout;
        let request = FetchRequest::new(url, stem)
            .with_bitrate(self.config.bitrate_kbps)
            .with_timeout(limit);

        // The resolver enforces `limit` itself and reaps its processes before
        // returning. This outer bound only catches a resolver that does not.
        match timeout(limit + RESOLVER_GRACE, self.resolver.fetch_audio(&request)).await {
            Ok(result) => result.map_err(as_fetch_error)?,
            Err(_) => return Err(Error::timeout("Download", limit)),
        }

        let output = reconcile_output(stem).await?;
        let payload = tokio::fs::read(&output)
            .await
            .map_err(|e| Error::io_path("reading transcoded audio", &output, e))?;
        remove_best_effort(&output).await;

        if payload.is_empty() {
            return Err(Error::ConversionFailed {
                stem: stem.display().to_string(),
            });
        }

        let track = TrackDbModel::new(id, metadata, &request.url, payload);
        self.tracks.put(&track).await?;
        Ok(track.summary())
    }
}

fn as_resolution_error(err: Error) -> Error {
    match err {
        Error::Resolution(_) | Error::Timeout { .. } | Error::NoMetadata => err,
        other => Error::Resolution(other.to_string()),
    }
}

fn as_fetch_error(err: Error) -> Error {
    match err {
        Error::Fetch(_) | Error::Timeout { .. } | Error::ConversionFailed { .. } => err,
        other => Error::Fetch(other.to_string()),
    }
}
