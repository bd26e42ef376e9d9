//! HTTP API server for external control
//!
//! This module provides a REST API for driving the recording controller:
//! - POST /recorder/start | pause | resume | stop - Lifecycle operations
//! - GET /recorder/status - Observable controller state
//! - GET /recorder/artifact - Bytes of the last artifact
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, ArtifactStore};
