// Native PCM capture host
//
// Serves a decoded audio file (or a synthetic tone) as a live capture stream
// and encodes it as raw 16-bit big-endian PCM (`audio/l16`, RFC 2586).
// Raw PCM concatenates cleanly, so an artifact assembled from the fragments
// of several encoder sessions is itself a valid L16 stream.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::constraints::CaptureConstraints;
use super::host::{
    CaptureCapability, CaptureHost, EncoderFactory, EncoderOptions, MediaEncoder, Origin,
    StreamFailure, StreamSuccess,
};
use super::source::LiveAudio;
use super::stream::{StreamHandle, TrackKind};
use crate::error::{DenialError, DenialKind};
use crate::recorder::{container_type, ChunkSink};

pub const L16_TYPE: &str = "audio/l16";

/// How often the encoder thread pulls new frames from the source
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Configuration for the PCM capture host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PcmHostConfig {
    /// Origin the host reports to the negotiator
    pub origin: String,

    /// Entry point the host exposes
    pub capability: CaptureCapability,

    /// Audio file to serve; a tone is generated when absent
    pub source_path: Option<PathBuf>,

    /// Tone frequency when no file is configured
    pub tone_hz: f32,

    /// Tone sample rate
    pub sample_rate: u32,

    /// Tone channel count
    pub channels: u16,
}

impl Default for PcmHostConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            capability: CaptureCapability::Modern,
            source_path: None,
            tone_hz: 440.0,
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Capture host backed by a `LiveAudio` source
pub struct PcmCaptureHost {
    config: PcmHostConfig,
}

impl PcmCaptureHost {
    pub fn new(config: PcmHostConfig) -> Self {
        Self { config }
    }

    fn open_stream(&self, constraints: &CaptureConstraints) -> Result<StreamHandle, DenialError> {
        if !constraints.audio {
            let message = if constraints.wants_video() {
                "PCM host has no video device"
            } else {
                "at least one of audio or video must be requested"
            };
            return Err(DenialError::new(DenialKind::Overconstrained, message));
        }
        if constraints.wants_video() {
            warn!("PCM host has no video device, granting the audio track only");
        }

        let source = match &self.config.source_path {
            Some(path) => LiveAudio::open(path),
            None => LiveAudio::tone(
                self.config.tone_hz,
                self.config.sample_rate,
                self.config.channels,
            ),
        }
        .map_err(|e| DenialError::new(DenialKind::NotFound, format!("{:#}", e)))?;

        let stream = StreamHandle::with_audio(vec![TrackKind::Audio], Arc::new(source));
        info!("PCM host granted stream {}", stream.id());
        Ok(stream)
    }
}

#[async_trait::async_trait]
impl CaptureHost for PcmCaptureHost {
    fn origin(&self) -> Origin {
        Origin::parse(&self.config.origin)
    }

    fn capability(&self) -> CaptureCapability {
        self.config.capability
    }

    async fn request_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<StreamHandle, DenialError> {
        self.open_stream(constraints)
    }

    fn request_stream_legacy(
        &self,
        constraints: &CaptureConstraints,
        on_success: StreamSuccess,
        on_failure: StreamFailure,
    ) {
        match self.open_stream(constraints) {
            Ok(stream) => on_success(stream),
            Err(e) => on_failure(e),
        }
    }
}

/// Encoder factory producing `audio/l16` encoders
#[derive(Debug, Clone, Copy, Default)]
pub struct PcmEncoderFactory;

impl EncoderFactory for PcmEncoderFactory {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        container_type(mime_type) == L16_TYPE
    }

    fn create(
        &self,
        stream: &StreamHandle,
        options: EncoderOptions,
    ) -> Result<Box<dyn MediaEncoder>> {
        if let Some(requested) = options.mime_type.as_deref() {
            if !self.is_type_supported(requested) {
                bail!("NotSupportedError: {} is not supported", requested);
            }
        }

        let audio = stream
            .audio()
            .cloned()
            .context("Stream carries no audio source")?;

        Ok(Box::new(PcmEncoder::new(audio)))
    }
}

/// Real-time L16 encoder reading from a live source on a worker thread
pub struct PcmEncoder {
    audio: Arc<LiveAudio>,
    mime_type: String,
    worker: Option<Worker>,
    started: bool,
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl PcmEncoder {
    pub fn new(audio: Arc<LiveAudio>) -> Self {
        let mime_type = format!(
            "{};rate={};channels={}",
            L16_TYPE, audio.sample_rate, audio.channels
        );

        Self {
            audio,
            mime_type,
            worker: None,
            started: false,
        }
    }

    fn to_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_be_bytes()).collect()
    }

    fn run(
        audio: Arc<LiveAudio>,
        mut cursor: u64,
        time_slice: Duration,
        sink: ChunkSink,
        stop: Arc<AtomicBool>,
    ) {
        let mut pending: Vec<u8> = Vec::new();
        let mut last_emit = Instant::now();

        debug!("PCM encoder thread started at frame {}", cursor);

        loop {
            let stopping = stop.load(Ordering::SeqCst);

            let now = audio.position();
            if now > cursor {
                pending.extend(Self::to_bytes(&audio.read(cursor, now)));
                cursor = now;
            }

            if stopping {
                break;
            }

            if !time_slice.is_zero() && last_emit.elapsed() >= time_slice {
                sink.deliver(std::mem::take(&mut pending));
                last_emit = Instant::now();
            }

            std::thread::sleep(POLL_INTERVAL);
        }

        // Final flush, always before the join in `stop()` returns
        sink.deliver(pending);
        debug!("PCM encoder thread stopped at frame {}", cursor);
    }
}

impl MediaEncoder for PcmEncoder {
    fn mime_type(&self) -> Option<String> {
        Some(self.mime_type.clone())
    }

    fn start(&mut self, time_slice: Duration, sink: ChunkSink) -> Result<()> {
        if self.started {
            bail!("InvalidStateError: encoder was already started");
        }

        let stop = Arc::new(AtomicBool::new(false));
        let audio = Arc::clone(&self.audio);
        let stop_flag = Arc::clone(&stop);
        // Capture starts now, not whenever the thread gets scheduled
        let cursor = self.audio.position();

        let handle = std::thread::Builder::new()
            .name("pcm-encoder".to_string())
            .spawn(move || Self::run(audio, cursor, time_slice, sink, stop_flag))
            .context("Failed to spawn encoder thread")?;

        self.worker = Some(Worker { stop, handle });
        self.started = true;

        info!(
            "PCM encoder started ({}, time slice {}ms)",
            self.mime_type,
            time_slice.as_millis()
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        worker.stop.store(true, Ordering::SeqCst);
        if worker.handle.join().is_err() {
            bail!("Encoder thread panicked");
        }

        info!("PCM encoder stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "pcm"
    }
}

impl Drop for PcmEncoder {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = MediaEncoder::stop(self) {
                error!("Failed to stop PCM encoder on drop: {}", e);
            }
        }
    }
}

/// Sample rate and channel count from an `audio/l16;rate=..;channels=..` type
pub fn l16_params(mime_type: &str) -> Option<(u32, u16)> {
    if container_type(mime_type) != L16_TYPE {
        return None;
    }

    let mut rate = None;
    let mut channels = 1;
    for param in mime_type.split(';').skip(1) {
        match param.trim().split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("rate") => {
                rate = value.trim().parse().ok();
            }
            Some((key, value)) if key.trim().eq_ignore_ascii_case("channels") => {
                match value.trim().parse() {
                    Ok(count) => channels = count,
                    Err(_) => warn!("Ignoring invalid channel count in {}", mime_type),
                }
            }
            _ => {}
        }
    }

    rate.map(|rate| (rate, channels))
}
