//! yt-dlp based media resolver.

use async_trait::async_trait;
use process_utils::{ProcessError, run_with_deadline, tokio_command};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::{FetchRequest, MediaResolver, TARGET_AUDIO_CODEC};
use crate::domain::{RawMetadata, SourceUrl};
use crate::{Error, Result};

/// Deadline for `yt-dlp --version`.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// yt-dlp resolver configuration.
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Path to the yt-dlp binary.
    pub binary_path: String,
    /// Directory or binary path of ffmpeg, forwarded as `--ffmpeg-location`.
    pub ffmpeg_location: Option<String>,
    /// Extra arguments inserted before the URL.
    pub extra_args: Vec<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary_path: "yt-dlp".to_string(),
            ffmpeg_location: None,
            extra_args: Vec::new(),
        }
    }
}

/// Resolver that shells out to yt-dlp (which in turn runs ffmpeg).
pub struct YtDlpResolver {
    config: YtDlpConfig,
}

impl YtDlpResolver {
    /// Create a resolver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(YtDlpConfig::default())
    }

    pub fn with_config(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Arguments for a metadata-only run.
    fn build_inspect_args(&self, url: &SourceUrl) -> Vec<String> {
        let mut args: Vec<String> = [
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(url.as_str().to_string());
        args
    }

    /// Arguments for best-audio download + transcode.
    fn build_fetch_args(&self, request: &FetchRequest) -> Vec<String> {
        let mut args: Vec<String> = [
            "-f",
            "bestaudio/best",
            "--extract-audio",
            "--audio-format",
            TARGET_AUDIO_CODEC,
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "--no-progress",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend([
            "--audio-quality".to_string(),
            format!("{}K", request.bitrate_kbps),
        ]);

        if let Some(ref ffmpeg) = self.config.ffmpeg_location {
            args.extend(["--ffmpeg-location".to_string(), ffmpeg.clone()]);
        }

        // `%` starts a field in yt-dlp output templates.
        let stem = request
            .output_stem
            .to_string_lossy()
            .replace('%', "%%");
        args.extend(["-o".to_string(), format!("{stem}.%(ext)s")]);

        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(request.url.as_str().to_string());
        args
    }

    /// Pick the most useful line of stderr for an error message.
    fn error_message(stderr: &[u8], exit_code: Option<i32>) -> String {
        let stderr = String::from_utf8_lossy(stderr);
        let lines: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        lines
            .iter()
            .rev()
            .find(|l| l.starts_with("ERROR:"))
            .or_else(|| lines.last())
            .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
            .unwrap_or_else(|| format!("yt-dlp exited with code {}", exit_code.unwrap_or(-1)))
    }

    /// Run yt-dlp with the given arguments, converting process failures with `wrap`.
    ///
    /// yt-dlp and the ffmpeg it launches share a process group, which is
    /// killed and waited for when `deadline` passes.
    async fn run(
        &self,
        operation: &'static str,
        args: &[String],
        deadline: Option<Duration>,
        wrap: fn(String) -> Error,
    ) -> Result<std::process::Output> {
        debug!("yt-dlp {} args: {:?}", operation, args);

        let mut cmd = tokio_command(&self.config.binary_path);
        cmd.args(args).env("LC_ALL", "C");

        let output = run_with_deadline(&mut cmd, deadline)
            .await
            .map_err(|e| match e {
                ProcessError::TimedOut { timeout, .. } => {
                    warn!("yt-dlp {} killed after {:?}", operation, timeout);
                    Error::timeout(operation, timeout)
                }
                other => wrap(other.to_string()),
            })?;

        if !output.status.success() {
            let message = Self::error_message(&output.stderr, output.status.code());
            warn!("yt-dlp {} failed: {}", operation, message);
            return Err(wrap(message));
        }

        Ok(output)
    }

    /// Parse `--dump-single-json` output.
    fn parse_inspect_output(stdout: &[u8]) -> Result<Option<RawMetadata>> {
        let text = String::from_utf8_lossy(stdout);
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::Resolution(format!("unreadable resolver output: {e}")))?;

        Ok(match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn inspect(&self, url: &SourceUrl) -> Result<Option<RawMetadata>> {
        let args = self.build_inspect_args(url);
        let output = self
            .run("Metadata extraction", &args, None, Error::Resolution)
            .await?;
        Self::parse_inspect_output(&output.stdout)
    }

    async fn fetch_audio(&self, request: &FetchRequest) -> Result<()> {
        let args = self.build_fetch_args(request);
        info!(
            url = %request.url,
            output = %request.output_stem.display(),
            "Starting yt-dlp audio download"
        );
        self.run("Download", &args, request.timeout, Error::Fetch)
            .await?;
        Ok(())
    }

    async fn version(&self) -> Option<String> {
        let mut cmd = tokio_command(&self.config.binary_path);
        cmd.arg("--version");
        let output = run_with_deadline(&mut cmd, Some(VERSION_PROBE_TIMEOUT))
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8(output.stdout)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
