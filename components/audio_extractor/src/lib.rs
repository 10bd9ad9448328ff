// components/audio_extractor/src/lib.rs
mod naming;
mod types;
mod ytdlp;

use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::warn;
use url::Url;

pub use naming::{sanitize_title, timestamp_stem, FALLBACK_STEM};
pub use types::{ExtractError, ExtractedAudio, TrackInfo};
pub use ytdlp::{Extractor, YtDlp};

/// How output file stems are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNaming {
    /// `audio_<unix-millis>` — one subprocess per request.
    Timestamp,
    /// Sanitized source title, falling back to the timestamp stem when the
    /// title is empty or the metadata probe fails. Friendlier filenames at
    /// the cost of a second subprocess per request.
    Title,
}

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub naming: FileNaming,
    /// Cap on concurrently running extraction subprocesses.
    pub max_concurrent: usize,
    /// Wall-clock budget for a single tool invocation.
    pub tool_timeout: Duration,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            naming: FileNaming::Timestamp,
            max_concurrent: 4,
            tool_timeout: Duration::from_secs(300),
        }
    }
}

/// Turns a source URL into an audio file in the scratch directory.
///
/// Owns the scratch directory handle so tests can inject a temporary one,
/// a semaphore bounding how many extraction subprocesses run at once, and a
/// reservation set of output names currently in flight.
pub struct AudioExtractor {
    scratch_dir: PathBuf,
    naming: FileNaming,
    limiter: Semaphore,
    issued: Mutex<HashSet<PathBuf>>,
    extractor: Arc<dyn Extractor + Send + Sync>,
}

impl AudioExtractor {
    /// Create an extractor backed by the real `yt-dlp` tool.
    pub async fn new(
        scratch_dir: impl AsRef<Path>,
        options: ExtractorOptions,
    ) -> Result<Self, ExtractError> {
        let tool = Arc::new(YtDlp::new(options.tool_timeout));
        Self::with_extractor(scratch_dir, options, tool).await
    }

    /// Create an extractor with a specific tool implementation.
    pub async fn with_extractor(
        scratch_dir: impl AsRef<Path>,
        options: ExtractorOptions,
        extractor: Arc<dyn Extractor + Send + Sync>,
    ) -> Result<Self, ExtractError> {
        extractor.check_available().await?;

        let scratch_dir = scratch_dir.as_ref().to_owned();

        // Idempotent: the directory may already exist from a previous run.
        tokio::fs::create_dir_all(&scratch_dir).await?;

        Ok(Self {
            scratch_dir,
            naming: options.naming,
            limiter: Semaphore::new(options.max_concurrent),
            issued: Mutex::new(HashSet::new()),
            extractor,
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Download and transcode the audio behind `url` into the scratch
    /// directory, returning the file's location and download filename.
    pub async fn extract(&self, url: &str) -> Result<ExtractedAudio, ExtractError> {
        let url = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ExtractError::Launch("extraction limiter closed".to_string()))?;

        let stem = self.derive_stem(&url).await;
        let path = self.unique_path(&stem);
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => format!("{stem}.mp3"),
        };

        let result = self.extractor.extract_audio(&url, &path).await;

        if let Err(err) = result {
            // A failed run may still have written a partial file; the
            // bounded-growth guarantee says nothing of it survives.
            if let Err(cleanup_err) = tokio::fs::remove_file(&path).await {
                if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        path = %path.display(),
                        error = %cleanup_err,
                        "failed to remove partial output"
                    );
                }
            }
            self.issued.lock().remove(&path);
            return Err(err);
        }

        // The reservation has done its job: the file itself now occupies
        // the name until delivery removes it.
        self.issued.lock().remove(&path);

        Ok(ExtractedAudio { path, file_name })
    }

    /// Fetch the source's display title, sanitized for use as a filename.
    pub async fn probe_title(&self, url: &str) -> Result<String, ExtractError> {
        let url = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
        let info = self.extractor.probe(&url).await?;
        Ok(sanitize_title(&info.title))
    }

    async fn derive_stem(&self, url: &Url) -> String {
        match self.naming {
            FileNaming::Timestamp => timestamp_stem(),
            FileNaming::Title => match self.extractor.probe(url).await {
                Ok(info) => {
                    let stem = sanitize_title(&info.title);
                    if stem == FALLBACK_STEM {
                        timestamp_stem()
                    } else {
                        stem
                    }
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "title probe failed, using timestamp stem");
                    timestamp_stem()
                }
            },
        }
    }

    /// Pick an output path no other in-flight extraction is using.
    ///
    /// Names are reserved in `issued` for the duration of their extraction,
    /// so two interleaved requests deriving the same stem get distinct
    /// files; the disk check covers finished extractions still awaiting
    /// delivery. Collisions fall back to a millisecond suffix, then a
    /// counter.
    fn unique_path(&self, stem: &str) -> PathBuf {
        let mut issued = self.issued.lock();
        let mut candidate = self.scratch_dir.join(format!("{stem}.mp3"));
        let mut attempt = 0u32;

        while issued.contains(&candidate) || candidate.exists() {
            let millis = chrono::Utc::now().timestamp_millis();
            candidate = if attempt == 0 {
                self.scratch_dir.join(format!("{stem}_{millis}.mp3"))
            } else {
                self.scratch_dir.join(format!("{stem}_{millis}_{attempt}.mp3"))
            };
            attempt += 1;
        }

        issued.insert(candidate.clone());
        candidate
    }
}
