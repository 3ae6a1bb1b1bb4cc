//! Process configuration loaded from environment variables.
//!
//! Every value has a default. Numeric values that are present but do not
//! parse are reported as [`Error::Configuration`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api::server::ApiServerConfig;
use crate::ingest::IngestConfig;
use crate::resolver::{DEFAULT_BITRATE_KBPS, YtDlpConfig};
use crate::{Error, Result};

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:songvault.db?mode=rwc";

/// Default scratch directory.
pub const DEFAULT_SCRATCH_DIR: &str = "./downloads";

/// Default API port.
pub const DEFAULT_API_PORT: u16 = 5000;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub ingest: IngestConfig,
    pub ytdlp: YtDlpConfig,
    /// Listener settings, including the optional front-end directory.
    pub api: ApiServerConfig,
    /// Directory for rotated log files, if any.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let mut ingest = IngestConfig::new(
            var("SCRATCH_DIR").unwrap_or_else(|| DEFAULT_SCRATCH_DIR.to_string()),
        );
        if let Some(secs) = parse_var::<u64>(&var, "SCRATCH_MAX_AGE_SECS")? {
            ingest.scratch_max_age = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&var, "FETCH_TIMEOUT_SECS")? {
            ingest.fetch_timeout = positive_secs("FETCH_TIMEOUT_SECS", secs)?;
        }
        if let Some(secs) = parse_var::<u64>(&var, "INSPECT_TIMEOUT_SECS")? {
            ingest.inspect_timeout = positive_secs("INSPECT_TIMEOUT_SECS", secs)?;
        }
        ingest.bitrate_kbps =
            parse_var::<u32>(&var, "AUDIO_BITRATE_KBPS")?.unwrap_or(DEFAULT_BITRATE_KBPS);
        if !(8..=320).contains(&ingest.bitrate_kbps) {
            return Err(Error::config(format!(
                "AUDIO_BITRATE_KBPS must be between 8 and 320, got {}",
                ingest.bitrate_kbps
            )));
        }

        let mut ytdlp = YtDlpConfig::default();
        if let Some(path) = var("YTDLP_PATH") {
            ytdlp.binary_path = path;
        }
        ytdlp.ffmpeg_location = var("FFMPEG_PATH");

        let mut api = ApiServerConfig {
            port: DEFAULT_API_PORT,
            static_dir: var("STATIC_DIR").map(PathBuf::from),
            ..ApiServerConfig::default()
        };
        if let Some(bind_address) = var("API_BIND_ADDRESS") {
            api.bind_address = bind_address;
        }
        if let Some(port) = parse_var::<u16>(&var, "API_PORT")? {
            api.port = port;
        }

        Ok(Self {
            database_url,
            ingest,
            ytdlp,
            api,
            log_dir: var("LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::config(format!("Invalid {key} value '{raw}': {e}")))
        })
        .transpose()
}

fn positive_secs(key: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::config(format!("{key} must be greater than 0")));
    }
    Ok(Duration::from_secs(secs))
}
