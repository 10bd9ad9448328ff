// components/audio_extractor/src/ytdlp.rs
use crate::types::{ExtractError, TrackInfo};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait Extractor {
    /// Check that the extraction tool and its dependencies are present.
    async fn check_available(&self) -> Result<(), ExtractError>;

    /// Fetch metadata about a source without downloading it.
    async fn probe(&self, url: &Url) -> Result<TrackInfo, ExtractError>;

    /// Extract the audio track, transcode it to mp3 and write it to `output`.
    async fn extract_audio(&self, url: &Url, output: &Path) -> Result<(), ExtractError>;
}

/// The real extractor, shelling out to `yt-dlp`.
///
/// Every invocation passes the URL and the output path as discrete argument
/// tokens, never through a shell, so nothing in a submitted URL can be
/// interpreted as command syntax.
pub struct YtDlp {
    tool_timeout: Duration,
}

impl YtDlp {
    pub fn new(tool_timeout: Duration) -> Self {
        Self { tool_timeout }
    }
}

fn launch_error(err: std::io::Error) -> ExtractError {
    match err.kind() {
        std::io::ErrorKind::NotFound => ExtractError::DependencyNotFound("yt-dlp"),
        _ => ExtractError::Launch(err.to_string()),
    }
}

#[async_trait]
impl Extractor for YtDlp {
    async fn check_available(&self) -> Result<(), ExtractError> {
        which::which("yt-dlp")
            .map(|_| ())
            .map_err(|_| ExtractError::DependencyNotFound("yt-dlp"))
    }

    async fn probe(&self, url: &Url) -> Result<TrackInfo, ExtractError> {
        debug!(url = %url, "probing metadata");

        let output = timeout(
            self.tool_timeout,
            Command::new("yt-dlp")
                .arg("--dump-json")
                .arg("--no-download")
                .arg(url.as_str())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ExtractError::Timeout(self.tool_timeout.as_secs()))?
        .map_err(launch_error)?;

        if !output.status.success() {
            return Err(ExtractError::Tool(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let meta: YtDlpMetadata = serde_json::from_slice(&output.stdout)
            .map_err(|e| ExtractError::Tool(format!("unparseable metadata: {e}")))?;

        Ok(TrackInfo {
            title: meta.title,
            uploader: meta.uploader,
            duration: meta.duration,
        })
    }

    async fn extract_audio(&self, url: &Url, output: &Path) -> Result<(), ExtractError> {
        let output_str = output
            .to_str()
            .ok_or_else(|| ExtractError::Launch("invalid output path".to_string()))?;

        debug!(url = %url, output = %output.display(), "spawning yt-dlp");

        let child = Command::new("yt-dlp")
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("0")
            .arg("-o")
            .arg(output_str)
            .arg(url.as_str())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(launch_error)?;

        // kill_on_drop reaps the child if the timeout fires or the request
        // future is dropped mid-extraction.
        let result = timeout(self.tool_timeout, child.wait_with_output())
            .await
            .map_err(|_| ExtractError::Timeout(self.tool_timeout.as_secs()))?
            .map_err(launch_error)?;

        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();

        if !result.status.success() {
            return Err(ExtractError::Tool(stderr));
        }

        // yt-dlp writes progress chatter to stderr even when it succeeds, so
        // stderr content alone proves nothing. The output file is the
        // authoritative signal.
        if !tokio::fs::try_exists(output).await? {
            return Err(ExtractError::Tool(if stderr.is_empty() {
                format!("no output file produced at {}", output.display())
            } else {
                stderr
            }));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpMetadata {
    title: String,
    uploader: Option<String>,
    duration: Option<f64>,
}
