//! Recording lifecycle
//!
//! This module provides the `RecordingController` state machine that manages:
//! - Binding the granted capture stream
//! - Codec negotiation against the host encoder
//! - start/pause/resume/stop, with pause emulated by terminating the encoder
//!   and resume by creating a new one on the same stream
//! - Chunk buffering across pause/resume and artifact assembly on stop

mod artifact;
mod chunk;
pub mod codec;
mod controller;
mod events;
mod options;
mod state;

pub use artifact::RecordedArtifact;
pub use chunk::{ChunkBuffer, ChunkSink};
pub use codec::{candidate_types, container_type, negotiate, DEFAULT_FALLBACK_TYPES};
pub use controller::RecordingController;
pub use events::{EventForwarder, RecorderCallbacks, RecorderEvent};
pub use options::RecorderOptions;
pub use state::{RecorderStatus, SessionState};
