//! Error types shared by the negotiator and the recording controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the host refused to hand out a capture stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The user (or a policy) refused the permission prompt
    NotAllowed,
    /// No device matching the requested media kinds exists
    NotFound,
    /// A device exists but cannot satisfy the constraints
    Overconstrained,
    /// The request was interrupted before it completed
    Aborted,
    Other,
}

impl std::fmt::Display for DenialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialKind::NotAllowed => write!(f, "not allowed"),
            DenialKind::NotFound => write!(f, "device not found"),
            DenialKind::Overconstrained => write!(f, "constraints unsatisfiable"),
            DenialKind::Aborted => write!(f, "aborted"),
            DenialKind::Other => write!(f, "other"),
        }
    }
}

/// The host's rejection of a stream request, wrapping its reported cause
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DenialError {
    pub kind: DenialKind,
    pub message: String,
}

impl DenialError {
    pub fn new(kind: DenialKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Failure to obtain a capture stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("host exposes no capture capability")]
    UnsupportedEnvironment,

    #[error("capture refused on insecure origin {origin}")]
    InsecureOrigin { origin: String },

    #[error("stream request denied: {0}")]
    Denied(#[from] DenialError),

    #[error("a stream was already requested by this negotiator")]
    AlreadyRequested,

    #[error("stream request dropped without an answer")]
    Aborted,
}

/// Errors reported to the caller through `RecorderCallbacks::on_error`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("failed to initialize encoder: {0}")]
    EncoderInit(String),

    #[error("encoder error: {0}")]
    Encoder(String),

    #[error("capture stream lost: {0}")]
    StreamLost(String),
}

/// Result type alias for negotiation
pub type NegotiationResult<T> = Result<T, NegotiationError>;
