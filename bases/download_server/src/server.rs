// bases/download_server/src/server.rs
use crate::config::Config;
use crate::delivery;
use crate::error::ApiError;
use audio_extractor::AudioExtractor;
use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    extractor: Arc<AudioExtractor>,
}

/// Build the HTTP router.
pub fn router(extractor: Arc<AudioExtractor>) -> Router {
    let state = AppState { extractor };

    Router::new()
        .route("/download", post(download))
        .route("/info", get(track_info))
        .with_state(state)
}

/// Run the download HTTP server
pub async fn run(config: Config, extractor: AudioExtractor) -> color_eyre::Result<()> {
    // Which origins may call us is a deployment decision: a single
    // configured origin, or any origin when none is given.
    let cors = match &config.allow_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]),
    };

    let app = router(Arc::new(extractor)).layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Download server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    url: String,
}

/// Handler for POST /download: extract, then stream the file back.
async fn download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response, ApiError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::MissingUrl);
    }

    info!(url, "download requested");

    let extracted = state.extractor.extract(url).await?;

    info!(file = %extracted.file_name, "extraction complete, streaming");

    delivery::audio_response(extracted).await
}

#[derive(Debug, Deserialize)]
struct InfoQuery {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    title: String,
}

/// Handler for GET /info: sanitized source title.
async fn track_info(
    State(state): State<AppState>,
    Query(query): Query<InfoQuery>,
) -> Result<Json<InfoResponse>, ApiError> {
    let url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::MissingUrl)?;

    let title = state.extractor.probe_title(url).await?;

    Ok(Json(InfoResponse { title }))
}
