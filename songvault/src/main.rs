use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use songvault::api::{ApiServer, AppState};
use songvault::config::AppConfig;
use songvault::database::{self, repositories::SqlxTrackRepository, repositories::TrackRepository};
use songvault::ingest::{IngestService, ensure_scratch_dir};
use songvault::library::TrackLibrary;
use songvault::logging;
use songvault::resolver::{MediaResolver, YtDlpResolver};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let (logging_config, _log_guard) = logging::init_logging(config.log_dir.as_deref())?;

    let cancel_token = CancellationToken::new();
    logging_config.start_retention_cleanup(cancel_token.clone());

    // Initialize database
    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    ensure_scratch_dir(&config.ingest.scratch_dir).await?;

    let resolver: Arc<dyn MediaResolver> =
        Arc::new(YtDlpResolver::with_config(config.ytdlp.clone()));
    match resolver.version().await {
        Some(version) => info!(resolver = resolver.name(), %version, "Media resolver available"),
        None => warn!(
            resolver = resolver.name(),
            path = %config.ytdlp.binary_path,
            "Media resolver not found; extraction and downloads will fail"
        ),
    }

    let tracks: Arc<dyn TrackRepository> = Arc::new(SqlxTrackRepository::new(pool.clone()));
    let ingest = Arc::new(IngestService::new(
        resolver,
        tracks.clone(),
        config.ingest.clone(),
    ));
    let library = TrackLibrary::new(tracks);
    let state = AppState::new(ingest, library).with_logging_config(logging_config);

    let server = ApiServer::new(config.api.clone(), state).with_cancel_token(cancel_token.clone());

    tokio::spawn({
        let cancel_token = cancel_token.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            info!("Shutdown signal received");
            cancel_token.cancel();
        }
    });

    info!(
        scratch_dir = %config.ingest.scratch_dir.display(),
        "songvault initialized successfully"
    );
    server.run().await?;

    cancel_token.cancel();
    pool.close().await;
    info!("songvault stopped");

    Ok(())
}
