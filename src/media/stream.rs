use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::source::LiveAudio;

/// Kind of media carried by a stream track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Handle to a live capture stream granted by the host
///
/// Not `Clone`: the recording controller owns it, and encoders only borrow it
/// while they are constructed.
#[derive(Debug)]
pub struct StreamHandle {
    id: Uuid,
    tracks: Vec<TrackKind>,
    audio: Option<Arc<LiveAudio>>,
}

impl StreamHandle {
    /// A stream with no backing media, used by hosts that encode elsewhere
    pub fn new(tracks: Vec<TrackKind>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
            audio: None,
        }
    }

    /// A stream backed by a live PCM source
    pub fn with_audio(tracks: Vec<TrackKind>, audio: Arc<LiveAudio>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
            audio: Some(audio),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[TrackKind] {
        &self.tracks
    }

    pub fn audio(&self) -> Option<&Arc<LiveAudio>> {
        self.audio.as_ref()
    }

    pub fn info(&self) -> StreamInfo {
        StreamInfo {
            id: self.id,
            tracks: self.tracks.clone(),
        }
    }
}

/// Cloneable description of a stream, handed to lifecycle callbacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: Uuid,
    pub tracks: Vec<TrackKind>,
}
