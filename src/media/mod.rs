//! Host media capabilities
//!
//! The recording core never talks to capture hardware directly. It depends on
//! the traits in `host`:
//! - `CaptureHost` hands out capture streams
//! - `EncoderFactory` / `MediaEncoder` turn a stream into encoded fragments
//!
//! `pcm` provides a native implementation of both over a looping PCM source.

pub mod constraints;
pub mod host;
pub mod pcm;
pub mod source;
pub mod stream;

pub use constraints::{CaptureConstraints, VideoConstraint, VideoDevice};
pub use host::{
    CaptureCapability, CaptureHost, EncoderFactory, EncoderOptions, MediaEncoder, Origin,
    StreamFailure, StreamSuccess,
};
pub use pcm::{l16_params, PcmCaptureHost, PcmEncoder, PcmEncoderFactory, PcmHostConfig, L16_TYPE};
pub use source::LiveAudio;
pub use stream::{StreamHandle, StreamInfo, TrackKind};
