use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, error, info, warn};

use super::metrics::metrics_handler;
use super::state::{GuardedPipeline, ServerState};
use super::{cors_headers, log_requests, ServerConfig};
use crate::beats::Beat;
use crate::playlist::{PipelineError, PlaylistPipeline, PlaylistResponse};

const NO_TRACKS_MESSAGE: &str =
    "No tracks matched the story beats for this title. Try another film or TV show.";

#[derive(Serialize)]
struct ServerStats {
    pub status: &'static str,
    pub uptime: String,
}

#[derive(Deserialize, Debug)]
struct GenerateRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Error responses of the HTTP edge.
#[derive(Debug)]
pub enum ApiError {
    MissingTitle,
    NoTracks { story_beats: Vec<Beat> },
    Internal { message: String },
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Empty { story_beats } => ApiError::NoTracks { story_beats },
            PipelineError::Failed { message } => ApiError::Internal { message },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingTitle => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing film or TV show title" })),
            )
                .into_response(),
            ApiError::NoTracks { story_beats } => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "No matching tracks found",
                    "message": NO_TRACKS_MESSAGE,
                    "storyBeats": story_beats,
                })),
            )
                .into_response(),
            ApiError::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Something went wrong.", "message": message })),
            )
                .into_response(),
        }
    }
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        status: "ok",
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method Not Allowed" })),
    )
}

async fn generate_playlist(
    State(pipeline): State<GuardedPipeline>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<PlaylistResponse>, ApiError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Rejected playlist request body");
            return Err(ApiError::MissingTitle);
        }
    };
    let title = body
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingTitle)?;

    info!(title = %title, "Generating playlist");
    match pipeline.generate(&title).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            match &err {
                PipelineError::Empty { .. } => warn!(title = %title, "No matching tracks found"),
                PipelineError::Failed { message } => {
                    error!(title = %title, error = %message, "Playlist generation failed")
                }
            }
            Err(err.into())
        }
    }
}

pub fn make_app(config: ServerConfig, pipeline: Arc<PlaylistPipeline>) -> Router {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        pipeline,
    };

    let playlist_routes = post(generate_playlist)
        .options(preflight)
        .fallback(method_not_allowed);

    Router::new()
        .route("/generate-playlist", playlist_routes)
        .route("/health", get(health))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(middleware::from_fn_with_state(
            config.allowed_origin.clone(),
            cors_headers,
        ))
        .with_state(state)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(config: ServerConfig, pipeline: Arc<PlaylistPipeline>) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, pipeline);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            info!("HTTP server stopped: {:?}", result);
            Ok(result?)
        },
        result = axum::serve(metrics_listener, make_metrics_app()).into_future() => {
            info!("Metrics server stopped: {:?}", result);
            Ok(result?)
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
