// Scriptable fakes for the host capture and encoder capabilities
//
// The fakes let tests drive the controller deterministically: chunks are
// emitted by hand instead of by real hardware.

#![allow(dead_code)]

use anyhow::{bail, Result};
use capture_recorder::{
    CaptureCapability, CaptureConstraints, CaptureHost, ChunkSink, DenialError, EncoderFactory,
    EncoderOptions, EventForwarder, MediaEncoder, Origin, PermissionNegotiator, RecordedArtifact,
    RecorderEvent, RecorderOptions, RecordingController, StreamHandle,
};
use capture_recorder::media::{StreamFailure, StreamSuccess};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Capture host with a scripted answer
pub struct FakeHost {
    pub origin: Origin,
    pub capability: CaptureCapability,
    pub denial: Option<DenialError>,
    /// Legacy path: drop both callbacks without calling either
    pub lose_legacy_callbacks: bool,
    requests: AtomicUsize,
}

impl FakeHost {
    pub fn granting() -> Self {
        Self {
            origin: Origin::new("https", "recorder.example"),
            capability: CaptureCapability::Modern,
            denial: None,
            lose_legacy_callbacks: false,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn denying(denial: DenialError) -> Self {
        Self {
            denial: Some(denial),
            ..Self::granting()
        }
    }

    pub fn with_capability(mut self, capability: CaptureCapability) -> Self {
        self.capability = capability;
        self
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Origin::parse(origin);
        self
    }

    /// Number of times the host was actually asked (i.e. prompted)
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn answer(&self, constraints: &CaptureConstraints) -> Result<StreamHandle, DenialError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match &self.denial {
            Some(denial) => Err(denial.clone()),
            None => Ok(StreamHandle::new(constraints.requested_tracks())),
        }
    }
}

#[async_trait::async_trait]
impl CaptureHost for FakeHost {
    fn origin(&self) -> Origin {
        self.origin.clone()
    }

    fn capability(&self) -> CaptureCapability {
        self.capability
    }

    async fn request_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<StreamHandle, DenialError> {
        self.answer(constraints)
    }

    fn request_stream_legacy(
        &self,
        constraints: &CaptureConstraints,
        on_success: StreamSuccess,
        on_failure: StreamFailure,
    ) {
        let answer = self.answer(constraints);
        if self.lose_legacy_callbacks {
            return;
        }

        // Answer from another task, like a host event loop would
        tokio::spawn(async move {
            match answer {
                Ok(stream) => on_success(stream),
                Err(e) => on_failure(e),
            }
        });
    }
}

#[derive(Default)]
struct FakeShared {
    /// Sink of the encoder currently started, if any
    active: Mutex<Option<ChunkSink>>,
    /// Delivered by the next `stop()`
    flush_on_stop: Mutex<Vec<u8>>,
    /// `mime_type` option of every constructed encoder
    created: Mutex<Vec<Option<String>>>,
    time_slices: Mutex<Vec<Duration>>,
    fail_create: AtomicBool,
    fail_start: AtomicBool,
    stops: AtomicUsize,
}

/// Encoder factory whose encoders emit only what the test tells them to
#[derive(Clone)]
pub struct FakeEncoderFactory {
    supported: Vec<String>,
    shared: Arc<FakeShared>,
}

impl FakeEncoderFactory {
    pub fn supporting(types: &[&str]) -> Self {
        Self {
            supported: types.iter().map(|t| t.to_string()).collect(),
            shared: Arc::new(FakeShared::default()),
        }
    }

    /// Deliver a fragment through the running encoder's sink
    pub fn emit(&self, data: &[u8]) -> bool {
        match self.shared.active.lock().as_ref() {
            Some(sink) => sink.deliver(data.to_vec()),
            None => false,
        }
    }

    /// Sink of the running encoder (to simulate late callbacks)
    pub fn active_sink(&self) -> Option<ChunkSink> {
        self.shared.active.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.active.lock().is_some()
    }

    /// Data the running encoder still holds and flushes when stopped
    pub fn hold_until_stop(&self, data: &[u8]) {
        *self.shared.flush_on_stop.lock() = data.to_vec();
    }

    pub fn fail_create(&self, fail: bool) {
        self.shared.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_start(&self, fail: bool) {
        self.shared.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn created(&self) -> Vec<Option<String>> {
        self.shared.created.lock().clone()
    }

    pub fn stops(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }

    pub fn time_slices(&self) -> Vec<Duration> {
        self.shared.time_slices.lock().clone()
    }
}

impl EncoderFactory for FakeEncoderFactory {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|t| t == mime_type)
    }

    fn create(
        &self,
        _stream: &StreamHandle,
        options: EncoderOptions,
    ) -> Result<Box<dyn MediaEncoder>> {
        if self.shared.fail_create.load(Ordering::SeqCst) {
            bail!("device revoked");
        }

        self.shared.created.lock().push(options.mime_type.clone());
        Ok(Box::new(FakeEncoder {
            mime_type: options.mime_type,
            shared: Arc::clone(&self.shared),
            sink: None,
        }))
    }
}

struct FakeEncoder {
    mime_type: Option<String>,
    shared: Arc<FakeShared>,
    sink: Option<ChunkSink>,
}

impl MediaEncoder for FakeEncoder {
    fn mime_type(&self) -> Option<String> {
        self.mime_type.clone()
    }

    fn start(&mut self, time_slice: Duration, sink: ChunkSink) -> Result<()> {
        if self.shared.fail_start.load(Ordering::SeqCst) {
            bail!("InvalidStateError");
        }
        if self.sink.is_some() {
            bail!("already started");
        }

        self.shared.time_slices.lock().push(time_slice);
        *self.shared.active.lock() = Some(sink.clone());
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            let pending = std::mem::take(&mut *self.shared.flush_on_stop.lock());
            sink.deliver(pending);
            *self.shared.active.lock() = None;
            self.shared.stops.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// A controller over `factory` that has already been granted a stream
pub async fn granted_controller(
    factory: &FakeEncoderFactory,
    options: RecorderOptions,
) -> (RecordingController, UnboundedReceiver<RecorderEvent>) {
    let (forwarder, events) = EventForwarder::new();
    let controller =
        RecordingController::new(Arc::new(factory.clone()), options, Arc::new(forwarder));

    let negotiator = PermissionNegotiator::new(Arc::new(FakeHost::granting()));
    controller
        .open(&negotiator, &CaptureConstraints::default())
        .await;

    (controller, events)
}

/// Everything emitted so far
pub fn drain(events: &mut UnboundedReceiver<RecorderEvent>) -> Vec<RecorderEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

pub fn artifacts(events: &[RecorderEvent]) -> Vec<RecordedArtifact> {
    events
        .iter()
        .filter_map(|event| match event {
            RecorderEvent::Stopped(artifact) => Some(artifact.clone()),
            _ => None,
        })
        .collect()
}
