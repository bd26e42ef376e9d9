use anyhow::{Context, Result};
use std::f32::consts::PI;
use std::path::Path;
use std::time::Instant;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{info, warn};

/// A looping PCM signal exposed as a live capture source
///
/// The source is "live" in the sense that its read position follows the wall
/// clock from the moment it was created: whatever played while no encoder
/// was reading is simply missed, as with a real microphone.
#[derive(Debug)]
pub struct LiveAudio {
    /// Interleaved i16 samples, played in a loop
    samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    epoch: Instant,
}

impl LiveAudio {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Result<Self> {
        anyhow::ensure!(sample_rate > 0, "Sample rate must be positive");
        anyhow::ensure!(channels > 0, "Channel count must be positive");
        anyhow::ensure!(
            !samples.is_empty() && samples.len() % channels as usize == 0,
            "Source needs at least one complete frame"
        );

        Ok(Self {
            samples,
            sample_rate,
            channels,
            epoch: Instant::now(),
        })
    }

    /// Decode an audio file (any format symphonia can probe) into a live source
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening capture source: {}", path.display());

        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open source file: {}", path.display()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Unsupported source format")?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .context("Source file has no decodable audio track")?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .context("Source track has no sample rate")?;
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(1);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create decoder")?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e).context("Failed to read packet"),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let mut buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet: {}", e);
                }
                Err(e) => return Err(e).context("Failed to decode packet"),
            }
        }

        info!(
            "Capture source loaded: {:.1}s, {}Hz, {} channels",
            samples.len() as f64 / (sample_rate as f64 * channels as f64),
            sample_rate,
            channels
        );

        Self::new(samples, sample_rate, channels)
    }

    /// One second of a sine tone, repeated forever
    pub fn tone(frequency_hz: f32, sample_rate: u32, channels: u16) -> Result<Self> {
        let mut samples = Vec::with_capacity(sample_rate as usize * channels as usize);
        for n in 0..sample_rate {
            let t = n as f32 / sample_rate as f32;
            let value = ((2.0 * PI * frequency_hz * t).sin() * i16::MAX as f32 * 0.25) as i16;
            for _ in 0..channels {
                samples.push(value);
            }
        }

        Self::new(samples, sample_rate, channels)
    }

    /// Frames elapsed since the source went live
    pub fn position(&self) -> u64 {
        (self.epoch.elapsed().as_secs_f64() * self.sample_rate as f64) as u64
    }

    /// Interleaved samples for frames `[from, to)`, wrapping around the loop
    pub fn read(&self, from: u64, to: u64) -> Vec<i16> {
        let channels = self.channels as usize;
        let loop_frames = (self.samples.len() / channels) as u64;
        let mut out = Vec::with_capacity(to.saturating_sub(from) as usize * channels);

        for frame in from..to {
            let start = (frame % loop_frames) as usize * channels;
            out.extend_from_slice(&self.samples[start..start + channels]);
        }

        out
    }
}
