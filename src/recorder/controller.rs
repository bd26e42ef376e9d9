use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::artifact::RecordedArtifact;
use super::chunk::{ChunkBuffer, ChunkSink};
use super::codec::{candidate_types, container_type, negotiate, DEFAULT_ARTIFACT_TYPE};
use super::events::{RecorderCallbacks, RecorderEvent};
use super::options::RecorderOptions;
use super::state::{RecorderStatus, SessionState};
use crate::error::{NegotiationError, RecorderError};
use crate::media::{
    CaptureConstraints, EncoderFactory, EncoderOptions, MediaEncoder, StreamHandle,
};
use crate::permission::PermissionNegotiator;

/// Mutable controller state, only touched under the controller lock
///
/// Encoder invariant: `encoder` is running iff `state == Recording`; in any
/// other state it is either absent or constructed but never started.
struct Inner {
    state: SessionState,

    /// Cleared by teardown; nothing mutates state afterwards
    alive: bool,

    asked: bool,
    permission: bool,
    available: bool,

    /// An encoder was successfully constructed at least once for this stream
    ever_available: bool,

    recording: bool,
    paused: bool,

    stream: Option<StreamHandle>,
    encoder: Option<Box<dyn MediaEncoder>>,

    /// Result of the last codec negotiation
    mime_type: Option<String>,

    /// Type the next artifact is tagged with
    artifact_type: String,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            alive: true,
            asked: false,
            permission: false,
            available: false,
            ever_available: false,
            recording: false,
            paused: false,
            stream: None,
            encoder: None,
            mime_type: None,
            artifact_type: DEFAULT_ARTIFACT_TYPE.to_string(),
        }
    }

    /// Stop and drop the running encoder, if any
    fn terminate_encoder(&mut self) -> Option<RecorderError> {
        let mut encoder = self.encoder.take()?;
        if self.state != SessionState::Recording {
            // Constructed but never started
            return None;
        }

        match encoder.stop() {
            Ok(()) => None,
            Err(e) => {
                error!("Failed to stop {} encoder: {:#}", encoder.name(), e);
                Some(RecorderError::Encoder(format!("{:#}", e)))
            }
        }
    }
}

/// Drives one capture-and-record session
///
/// All public operations are synchronous with respect to local state and never
/// panic or return errors; failures surface through `RecorderCallbacks` and
/// the flags in `status()`.
pub struct RecordingController {
    session_id: Uuid,
    inner: Mutex<Inner>,
    chunks: Arc<Mutex<ChunkBuffer>>,
    encoders: Arc<dyn EncoderFactory>,
    options: RecorderOptions,
    callbacks: Arc<dyn RecorderCallbacks>,
}

impl RecordingController {
    pub fn new(
        encoders: Arc<dyn EncoderFactory>,
        options: RecorderOptions,
        callbacks: Arc<dyn RecorderCallbacks>,
    ) -> Self {
        let session_id = Uuid::new_v4();
        info!("Creating recording controller: {}", session_id);

        Self {
            session_id,
            inner: Mutex::new(Inner::new()),
            chunks: Arc::new(Mutex::new(ChunkBuffer::new())),
            encoders,
            options,
            callbacks,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Get current observable state
    pub fn status(&self) -> RecorderStatus {
        let inner = self.inner.lock();
        let chunks = self.chunks.lock();

        RecorderStatus {
            state: inner.state,
            asked: inner.asked,
            permission: inner.permission,
            available: inner.available,
            recording: inner.recording,
            paused: inner.paused,
            chunk_count: chunks.len(),
            buffered_bytes: chunks.total_bytes(),
            mime_type: inner.mime_type.clone(),
        }
    }

    /// Session start: request the stream once and bind or reject it
    pub async fn open(&self, negotiator: &PermissionNegotiator, constraints: &CaptureConstraints) {
        {
            let mut inner = self.inner.lock();
            if !inner.alive || inner.state != SessionState::Idle {
                warn!("open() ignored in state {:?}", inner.state);
                return;
            }
            inner.state = SessionState::AwaitingPermission;
        }

        match negotiator.request_stream(constraints).await {
            Ok(stream) => self.permission_granted(stream),
            Err(e) => self.permission_denied(e),
        }
    }

    /// Bind a granted stream and initialize the encoder
    pub fn permission_granted(&self, stream: StreamHandle) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !inner.alive {
                debug!("Releasing stream {} granted after teardown", stream.id());
                return;
            }
            if !matches!(
                inner.state,
                SessionState::Idle | SessionState::AwaitingPermission
            ) {
                warn!("Ignoring second grant in state {:?}", inner.state);
                return;
            }

            info!("Permission granted, binding stream {}", stream.id());
            inner.stream = Some(stream);
            inner.permission = true;
            inner.asked = true;
            inner.recording = false;
            inner.state = SessionState::Ready;
            self.chunks.lock().clear();
            events.push(RecorderEvent::Granted);

            if let Err(e) = self.init_encoder(&mut inner) {
                events.push(RecorderEvent::Error(e));
            }
        }
        self.dispatch(events);
    }

    /// Record a failed negotiation; the session stays in `PermissionDenied`
    pub fn permission_denied(&self, error: NegotiationError) {
        {
            let mut inner = self.inner.lock();
            if !inner.alive {
                return;
            }
            if !matches!(
                inner.state,
                SessionState::Idle | SessionState::AwaitingPermission
            ) {
                warn!("Ignoring late denial in state {:?}", inner.state);
                return;
            }

            warn!("Permission not granted: {}", error);
            inner.state = SessionState::PermissionDenied;
            inner.asked = false;
            inner.permission = false;
            inner.stream = None;
        }

        let event = if matches!(error, NegotiationError::Denied(_)) {
            RecorderEvent::Denied(error)
        } else {
            RecorderEvent::Error(RecorderError::Negotiation(error))
        };
        self.dispatch(vec![event]);
    }

    /// Begin a fresh run; clears previously buffered chunks
    pub fn start(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !inner.alive || !inner.available {
                debug!("start() ignored: encoder not available");
                return;
            }
            if !matches!(inner.state, SessionState::Ready | SessionState::Stopped) {
                debug!("start() ignored in state {:?}", inner.state);
                return;
            }

            // The previous run's encoder is spent; build a fresh one
            let ready = if inner.encoder.is_some() {
                Ok(())
            } else {
                self.init_encoder(&mut inner)
            };

            let started = ready.and_then(|()| {
                let run = self.chunks.lock().begin_run();
                debug!("Opened run {}", run);
                self.start_encoder(&mut inner).map(|()| run)
            });
            match started {
                Ok(run) => {
                    inner.state = SessionState::Recording;
                    inner.recording = true;
                    inner.paused = false;
                    info!("Recording started (run {})", run);
                    if let Some(stream) = &inner.stream {
                        events.push(RecorderEvent::Started(stream.info()));
                    }
                }
                Err(e) => events.push(RecorderEvent::Error(e)),
            }
        }
        self.dispatch(events);
    }

    /// Terminate the running encoder, keeping its chunks for `resume()`
    pub fn pause(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !inner.alive || inner.state != SessionState::Recording {
                debug!("pause() ignored: not recording");
                return;
            }

            if let Some(e) = inner.terminate_encoder() {
                events.push(RecorderEvent::Error(e));
            }
            inner.state = SessionState::Paused;
            inner.paused = true;
            info!("Recording paused ({} chunks buffered)", self.chunks.lock().len());
            events.push(RecorderEvent::Paused);
        }
        self.dispatch(events);
    }

    /// Continue the current run with a new encoder on the same stream
    ///
    /// Guarded by the "recording" flag rather than by `Paused`: resuming while
    /// already recording restarts the encoder in place (the running one is
    /// terminated and flushed first).
    pub fn resume(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !inner.alive || !inner.recording || !inner.available {
                debug!("resume() ignored: no active run");
                return;
            }

            if inner.state == SessionState::Recording {
                info!("resume() while recording, restarting encoder");
                if let Some(e) = inner.terminate_encoder() {
                    events.push(RecorderEvent::Error(e));
                }
            }
            inner.state = SessionState::Paused;
            inner.paused = true;

            let resumed = match self.init_encoder(&mut inner) {
                Ok(()) => self.start_encoder(&mut inner),
                Err(e) => Err(e),
            };
            match resumed {
                Ok(()) => {
                    inner.state = SessionState::Recording;
                    inner.paused = false;
                    info!("Recording resumed ({} chunks kept)", self.chunks.lock().len());
                    if let Some(stream) = &inner.stream {
                        events.push(RecorderEvent::Resumed(stream.info()));
                    }
                }
                Err(e) => events.push(RecorderEvent::Error(e)),
            }
        }
        self.dispatch(events);
    }

    /// Terminate the encoder and hand the assembled artifact to the caller
    pub fn stop(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !inner.alive || !inner.ever_available {
                debug!("stop() ignored: no encoder was ever available");
                return;
            }

            if let Some(e) = inner.terminate_encoder() {
                events.push(RecorderEvent::Error(e));
            }
            events.push(RecorderEvent::Stopped(self.assemble(&inner)));

            inner.state = SessionState::Stopped;
            inner.recording = false;
            inner.paused = false;
        }
        self.dispatch(events);
    }

    /// The capture device went away: terminate and release the stream
    pub fn stream_lost(&self, reason: &str) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !inner.alive || inner.stream.is_none() {
                return;
            }

            error!("Capture stream lost: {}", reason);
            let was_active = inner.recording;
            if let Some(e) = inner.terminate_encoder() {
                events.push(RecorderEvent::Error(e));
            }
            if was_active {
                events.push(RecorderEvent::Stopped(self.assemble(&inner)));
            }

            inner.state = if was_active || inner.state == SessionState::Stopped {
                SessionState::Stopped
            } else {
                SessionState::PermissionDenied
            };
            inner.stream = None;
            inner.permission = false;
            inner.available = false;
            inner.ever_available = false;
            inner.recording = false;
            inner.paused = false;
            events.push(RecorderEvent::Error(RecorderError::StreamLost(
                reason.to_string(),
            )));
        }
        self.dispatch(events);
    }

    /// Session end: release the stream, drop encoder and chunks
    ///
    /// Idempotent. No callback fires and no pending delivery mutates state
    /// afterwards.
    pub fn teardown(&self) {
        let mut inner = self.inner.lock();
        if !inner.alive {
            return;
        }

        info!("Tearing down recording controller: {}", self.session_id);
        if let Some(e) = inner.terminate_encoder() {
            warn!("Encoder did not stop cleanly during teardown: {}", e);
        }
        inner.alive = false;
        inner.stream = None;
        inner.available = false;
        inner.ever_available = false;
        inner.recording = false;
        inner.paused = false;
        self.chunks.lock().close();
    }

    /// Negotiate a format and construct an encoder for the bound stream
    fn init_encoder(&self, inner: &mut Inner) -> Result<(), RecorderError> {
        let result = match &inner.stream {
            Some(stream) => {
                let candidates =
                    candidate_types(self.options.mime_type.as_deref(), &self.options.fallback_types);
                let negotiated = negotiate(self.encoders.as_ref(), &candidates);
                let options = EncoderOptions {
                    mime_type: Some(negotiated.clone()).filter(|t| !t.is_empty()),
                };
                self.encoders
                    .create(stream, options)
                    .map(|encoder| (negotiated, encoder))
            }
            None => Err(anyhow::anyhow!("No stream bound")),
        };

        match result {
            Ok((negotiated, encoder)) => {
                let produced = encoder
                    .mime_type()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| negotiated.clone());
                inner.artifact_type = if produced.is_empty() {
                    DEFAULT_ARTIFACT_TYPE.to_string()
                } else if crate::media::l16_params(&produced).is_some() {
                    // Keep rate/channels: the artifact is unusable without them
                    produced
                } else {
                    container_type(&produced)
                };

                info!(
                    "Encoder '{}' initialized (negotiated {:?}, artifact type {})",
                    encoder.name(),
                    negotiated,
                    inner.artifact_type
                );
                inner.mime_type = Some(negotiated);
                inner.encoder = Some(encoder);
                inner.available = true;
                inner.ever_available = true;
                Ok(())
            }
            Err(e) => {
                error!("Failed to initialize encoder: {:#}", e);
                inner.encoder = None;
                inner.available = false;
                Err(RecorderError::EncoderInit(format!("{:#}", e)))
            }
        }
    }

    /// Start the constructed encoder, feeding the current run
    fn start_encoder(&self, inner: &mut Inner) -> Result<(), RecorderError> {
        let sink = ChunkSink::new(&self.chunks);
        let Some(encoder) = inner.encoder.as_mut() else {
            return Err(RecorderError::Encoder("no encoder constructed".to_string()));
        };

        if let Err(e) = encoder.start(self.options.time_slice, sink) {
            error!("Failed to start {} encoder: {:#}", encoder.name(), e);
            inner.encoder = None;
            inner.available = false;
            return Err(RecorderError::Encoder(format!("{:#}", e)));
        }
        Ok(())
    }

    fn assemble(&self, inner: &Inner) -> RecordedArtifact {
        let chunks = self.chunks.lock();
        let artifact =
            RecordedArtifact::new(inner.artifact_type.clone(), chunks.concat(), chunks.len());
        info!(
            "Assembled artifact {}: {} bytes from {} chunks ({})",
            artifact.id,
            artifact.size(),
            artifact.chunk_count,
            artifact.mime_type
        );
        artifact
    }

    fn dispatch(&self, events: Vec<RecorderEvent>) {
        for event in events {
            match event {
                RecorderEvent::Granted => self.callbacks.on_granted(),
                RecorderEvent::Denied(e) => self.callbacks.on_denied(&e),
                RecorderEvent::Started(stream) => self.callbacks.on_start(&stream),
                RecorderEvent::Paused => self.callbacks.on_pause(),
                RecorderEvent::Resumed(stream) => self.callbacks.on_resume(&stream),
                RecorderEvent::Stopped(artifact) => self.callbacks.on_stop(artifact),
                RecorderEvent::Error(e) => self.callbacks.on_error(&e),
            }
        }
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        self.teardown();
    }
}
