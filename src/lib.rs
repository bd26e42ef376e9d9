pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod permission;
pub mod recorder;

pub use config::Config;
pub use error::{DenialError, DenialKind, NegotiationError, RecorderError};
pub use http::{create_router, AppState, ArtifactStore};
pub use media::{
    CaptureCapability, CaptureConstraints, CaptureHost, EncoderFactory, EncoderOptions,
    LiveAudio, MediaEncoder, Origin, PcmCaptureHost, PcmEncoderFactory, StreamHandle, StreamInfo,
    TrackKind,
};
pub use permission::PermissionNegotiator;
pub use recorder::{
    ChunkBuffer, ChunkSink, EventForwarder, RecordedArtifact, RecorderCallbacks, RecorderEvent,
    RecorderOptions, RecorderStatus, RecordingController, SessionState,
};
