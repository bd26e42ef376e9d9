use tokio::sync::mpsc;

use super::artifact::RecordedArtifact;
use crate::error::{NegotiationError, RecorderError};
use crate::media::StreamInfo;

/// Lifecycle callbacks supplied by the caller
///
/// Every method defaults to a no-op. Callbacks run after the controller has
/// released its state lock, so they may call back into the controller.
pub trait RecorderCallbacks: Send + Sync {
    fn on_granted(&self) {}

    fn on_denied(&self, _error: &NegotiationError) {}

    fn on_start(&self, _stream: &StreamInfo) {}

    fn on_pause(&self) {}

    fn on_resume(&self, _stream: &StreamInfo) {}

    /// Ownership of the artifact passes to the caller
    fn on_stop(&self, _artifact: RecordedArtifact) {}

    fn on_error(&self, _error: &RecorderError) {}
}

/// Events emitted during recording
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Granted,
    Denied(NegotiationError),
    Started(StreamInfo),
    Paused,
    Resumed(StreamInfo),
    Stopped(RecordedArtifact),
    Error(RecorderError),
}

/// Forwards every callback as a `RecorderEvent` over a channel
#[derive(Debug, Clone)]
pub struct EventForwarder {
    tx: mpsc::UnboundedSender<RecorderEvent>,
}

impl EventForwarder {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RecorderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: RecorderEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

impl RecorderCallbacks for EventForwarder {
    fn on_granted(&self) {
        self.send(RecorderEvent::Granted);
    }

    fn on_denied(&self, error: &NegotiationError) {
        self.send(RecorderEvent::Denied(error.clone()));
    }

    fn on_start(&self, stream: &StreamInfo) {
        self.send(RecorderEvent::Started(stream.clone()));
    }

    fn on_pause(&self) {
        self.send(RecorderEvent::Paused);
    }

    fn on_resume(&self, stream: &StreamInfo) {
        self.send(RecorderEvent::Resumed(stream.clone()));
    }

    fn on_stop(&self, artifact: RecordedArtifact) {
        self.send(RecorderEvent::Stopped(artifact));
    }

    fn on_error(&self, error: &RecorderError) {
        self.send(RecorderEvent::Error(error.clone()));
    }
}
