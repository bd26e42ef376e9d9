use serde::{Deserialize, Serialize};

use super::stream::TrackKind;

/// Which media kinds to request from the host, and with what parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConstraints {
    /// Request an audio track
    pub audio: bool,

    /// Request a video track (`true`/`false` or a device selector)
    pub video: VideoConstraint,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: VideoConstraint::Enabled(true),
        }
    }
}

impl CaptureConstraints {
    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: VideoConstraint::Enabled(false),
        }
    }

    pub fn wants_video(&self) -> bool {
        self.video.is_requested()
    }

    /// Track kinds a stream must carry to satisfy these constraints
    pub fn requested_tracks(&self) -> Vec<TrackKind> {
        let mut tracks = Vec::new();
        if self.audio {
            tracks.push(TrackKind::Audio);
        }
        if self.wants_video() {
            tracks.push(TrackKind::Video);
        }
        tracks
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoConstraint {
    Enabled(bool),
    Device(VideoDevice),
}

impl VideoConstraint {
    pub fn is_requested(&self) -> bool {
        !matches!(self, VideoConstraint::Enabled(false))
    }
}

/// Device selector and quality hints for the video track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDevice {
    pub device_id: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f32>,
}
