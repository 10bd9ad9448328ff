use audio_extractor::ExtractError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No URL provided")]
    MissingUrl,

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::MissingUrl => (StatusCode::BAD_REQUEST, "No URL provided", None),
            ApiError::Extract(err) => match err {
                ExtractError::InvalidUrl(details) => {
                    (StatusCode::BAD_REQUEST, "Invalid URL", Some(details))
                }
                ExtractError::Tool(details) | ExtractError::Launch(details) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Download failed",
                    Some(details),
                ),
                ExtractError::DependencyNotFound(tool) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Download failed",
                    Some(format!("Required dependency not found: {tool}")),
                ),
                ExtractError::Timeout(secs) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Download failed",
                    Some(format!("Extraction timed out after {secs} seconds")),
                ),
                ExtractError::Io(err) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    Some(err.to_string()),
                ),
            },
        };

        if status.is_server_error() {
            warn!(error, details = details.as_deref().unwrap_or(""), "request failed");
        }

        (
            status,
            Json(ErrorBody {
                error: error.to_string(),
                details,
            }),
        )
            .into_response()
    }
}
