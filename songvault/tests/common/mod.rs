//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use songvault::database::models::{TrackDbModel, TrackSummary};
use songvault::database::repositories::{SqlxTrackRepository, TrackRepository};
use songvault::database::{DbPool, init_pool_with_size, run_migrations};
use songvault::domain::{RawMetadata, SourceUrl};
use songvault::ingest::{IngestConfig, IngestService};
use songvault::library::TrackLibrary;
use songvault::resolver::{FetchRequest, MediaResolver, with_extension_suffix};
use songvault::{Error, Result};

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Bytes written by the fake transcoder.
pub const FAKE_AUDIO: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00\xff\xfb\x90\x64fake-mp3-frames";

/// What the fake resolver does when asked to fetch.
#[derive(Debug, Clone)]
pub enum FetchBehavior {
    /// Write `FAKE_AUDIO` at `<stem>.<ext>`.
    Produce(&'static str),
    /// Leave a partial download behind and fail.
    Fail(String),
    /// Succeed without producing anything.
    ProduceNothing,
    /// Leave a partial download behind and never finish.
    Hang,
}

/// Scripted in-process stand-in for the yt-dlp resolver.
pub struct ScriptedResolver {
    pub metadata: Option<Value>,
    pub fetch: FetchBehavior,
    pub inspect_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(fetch: FetchBehavior) -> Self {
        Self {
            metadata: Some(serde_json::json!({
                "title": "Never Gonna Give You Up",
                "uploader": "Rick Astley",
                "duration": 213,
                "thumbnails": [
                    {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg"},
                    {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"}
                ]
            })),
            fetch,
            inspect_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn producing(ext: &'static str) -> Self {
        Self::new(FetchBehavior::Produce(ext))
    }

    pub fn with_metadata(mut self, metadata: Option<Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn calls(&self) -> usize {
        self.inspect_calls.load(Ordering::SeqCst) + self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaResolver for ScriptedResolver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn inspect(&self, _url: &SourceUrl) -> Result<Option<RawMetadata>> {
        self.inspect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .metadata
            .as_ref()
            .and_then(|v| v.as_object().cloned()))
    }

    async fn fetch_audio(&self, request: &FetchRequest) -> Result<()> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let partial = with_extension_suffix(&request.output_stem, "webm.part");

        match &self.fetch {
            FetchBehavior::Produce(ext) => {
                let path = with_extension_suffix(&request.output_stem, ext);
                tokio::fs::write(path, FAKE_AUDIO).await?;
                Ok(())
            }
            FetchBehavior::Fail(message) => {
                tokio::fs::write(partial, b"partial").await?;
                Err(Error::Fetch(message.clone()))
            }
            FetchBehavior::ProduceNothing => Ok(()),
            FetchBehavior::Hang => {
                tokio::fs::write(partial, b"partial").await?;
                match request.timeout {
                    Some(limit) => {
                        tokio::time::sleep(limit).await;
                        Err(Error::timeout("Download", limit))
                    }
                    None => {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(())
                    }
                }
            }
        }
    }

    async fn version(&self) -> Option<String> {
        Some("scripted-1.0".to_string())
    }
}

/// Repository whose writes always fail, for exercising persistence errors.
pub struct FailingPutRepository {
    pub inner: SqlxTrackRepository,
}

#[async_trait]
impl TrackRepository for FailingPutRepository {
    async fn put(&self, _track: &TrackDbModel) -> Result<()> {
        Err(Error::Other("disk I/O error".to_string()))
    }

    async fn get(&self, id: &str) -> Result<TrackSummary> {
        self.inner.get(id).await
    }

    async fn get_payload(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get_payload(id).await
    }

    async fn list(&self) -> Result<Vec<TrackSummary>> {
        self.inner.list().await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn count(&self) -> Result<i64> {
        self.inner.count().await
    }
}

/// A migrated file-backed database in a temporary directory.
pub async fn setup_test_db() -> (DbPool, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("songvault.db").display());
    let pool = init_pool_with_size(&url, 4)
        .await
        .expect("Failed to create test pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    (pool, dir)
}

/// Everything an ingestion test needs.
pub struct Harness {
    pub ingest: Arc<IngestService>,
    pub library: TrackLibrary,
    pub repository: Arc<dyn TrackRepository>,
    pub resolver: Arc<ScriptedResolver>,
    pub pool: DbPool,
    pub scratch: TempDir,
    _db_dir: TempDir,
}

impl Harness {
    pub async fn new(resolver: ScriptedResolver) -> Self {
        Self::build(resolver, |_| {}, false).await
    }

    pub async fn with_config(
        resolver: ScriptedResolver,
        configure: impl FnOnce(&mut IngestConfig),
    ) -> Self {
        Self::build(resolver, configure, false).await
    }

    pub async fn with_failing_store(resolver: ScriptedResolver) -> Self {
        Self::build(resolver, |_| {}, true).await
    }

    async fn build(
        resolver: ScriptedResolver,
        configure: impl FnOnce(&mut IngestConfig),
        failing_store: bool,
    ) -> Self {
        let (pool, db_dir) = setup_test_db().await;
        let scratch = TempDir::new().expect("Failed to create scratch dir");

        let sqlx_repo = SqlxTrackRepository::new(pool.clone());
        let repository: Arc<dyn TrackRepository> = if failing_store {
            Arc::new(FailingPutRepository { inner: sqlx_repo })
        } else {
            Arc::new(sqlx_repo)
        };

        let mut config = IngestConfig::new(scratch.path());
        configure(&mut config);

        let resolver = Arc::new(resolver);
        let ingest = Arc::new(IngestService::new(
            resolver.clone(),
            repository.clone(),
            config,
        ));
        let library = TrackLibrary::new(repository.clone());

        Self {
            ingest,
            library,
            repository,
            resolver,
            pool,
            scratch,
            _db_dir: db_dir,
        }
    }

    /// Names of the files currently in the scratch directory.
    pub fn scratch_entries(&self) -> Vec<String> {
        std::fs::read_dir(self.scratch.path())
            .expect("scratch dir readable")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect()
    }
}
