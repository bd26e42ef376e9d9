use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{NegotiationError, RecorderError};
use crate::recorder::{RecordedArtifact, RecorderCallbacks, RecordingController};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The session this server controls
    pub controller: Arc<RecordingController>,

    /// Receives the controller's callbacks
    pub artifacts: Arc<ArtifactStore>,
}

impl AppState {
    pub fn new(controller: Arc<RecordingController>, artifacts: Arc<ArtifactStore>) -> Self {
        Self {
            controller,
            artifacts,
        }
    }
}

/// Keeps the most recent artifact handed over by `on_stop`
#[derive(Debug, Default)]
pub struct ArtifactStore {
    last: RwLock<Option<RecordedArtifact>>,
    last_error: RwLock<Option<RecorderError>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<RecordedArtifact> {
        self.last.read().clone()
    }

    /// Id of the last artifact, without copying its bytes
    pub fn last_id(&self) -> Option<Uuid> {
        self.last.read().as_ref().map(|artifact| artifact.id)
    }

    pub fn last_error(&self) -> Option<RecorderError> {
        self.last_error.read().clone()
    }
}

impl RecorderCallbacks for ArtifactStore {
    fn on_granted(&self) {
        info!("Capture permission granted");
    }

    fn on_denied(&self, error: &NegotiationError) {
        error!("Capture permission denied: {}", error);
        *self.last_error.write() = Some(RecorderError::Negotiation(error.clone()));
    }

    fn on_stop(&self, artifact: RecordedArtifact) {
        info!("Storing artifact {} ({} bytes)", artifact.id, artifact.size());
        *self.last.write() = Some(artifact);
    }

    fn on_error(&self, error: &RecorderError) {
        error!("Recorder error: {}", error);
        *self.last_error.write() = Some(error.clone());
    }
}
