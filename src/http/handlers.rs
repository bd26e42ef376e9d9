use super::state::AppState;
use crate::recorder::{RecordedArtifact, RecorderStatus, RecordingController};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub status: RecorderStatus,
    /// Metadata of the artifact produced by this stop, if any
    pub artifact: Option<RecordedArtifact>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Run a controller operation off the async workers and report the new status
///
/// Stopping an encoder joins its worker thread, so operations go through
/// `spawn_blocking`.
async fn control<F>(state: &AppState, op: F) -> Result<RecorderStatus, Response>
where
    F: FnOnce(&RecordingController) + Send + 'static,
{
    let controller = Arc::clone(&state.controller);
    tokio::task::spawn_blocking(move || {
        op(&controller);
        controller.status()
    })
    .await
    .map_err(|e| {
        error!("Recorder operation failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Recorder operation failed: {}", e),
            }),
        )
            .into_response()
    })
}

/// POST /recorder/start
pub async fn start(State(state): State<AppState>) -> Response {
    info!("HTTP start");
    match control(&state, RecordingController::start).await {
        Ok(status) => Json(status).into_response(),
        Err(response) => response,
    }
}

/// POST /recorder/pause
pub async fn pause(State(state): State<AppState>) -> Response {
    info!("HTTP pause");
    match control(&state, RecordingController::pause).await {
        Ok(status) => Json(status).into_response(),
        Err(response) => response,
    }
}

/// POST /recorder/resume
pub async fn resume(State(state): State<AppState>) -> Response {
    info!("HTTP resume");
    match control(&state, RecordingController::resume).await {
        Ok(status) => Json(status).into_response(),
        Err(response) => response,
    }
}

/// POST /recorder/stop
/// Stop recording; the artifact is kept for GET /recorder/artifact
pub async fn stop(State(state): State<AppState>) -> Response {
    info!("HTTP stop");
    let before = state.artifacts.last_id();
    let status = match control(&state, RecordingController::stop).await {
        Ok(status) => status,
        Err(response) => return response,
    };

    let artifact = if state.artifacts.last_id() != before {
        state.artifacts.last()
    } else {
        None
    };

    Json(StopResponse { status, artifact }).into_response()
}

/// GET /recorder/status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.status())
}

/// GET /recorder/artifact
/// Raw bytes of the last artifact, tagged with its MIME type
pub async fn artifact(State(state): State<AppState>) -> impl IntoResponse {
    match state.artifacts.last() {
        Some(artifact) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, artifact.mime_type.clone())],
            artifact.data,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No artifact recorded yet".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
