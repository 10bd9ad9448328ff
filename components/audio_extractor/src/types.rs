// components/audio_extractor/src/types.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Required dependency not found: {0}")]
    DependencyNotFound(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to launch extraction tool: {0}")]
    Launch(String),

    #[error("Extraction tool failed: {0}")]
    Tool(String),

    #[error("Extraction timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished extraction: where the audio landed on disk and the
/// filename a client should save it under.
#[derive(Debug, Clone)]
pub struct ExtractedAudio {
    pub path: PathBuf,
    pub file_name: String,
}

/// Metadata reported by the extraction tool without downloading anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub uploader: Option<String>,
    pub duration: Option<f64>,
}
