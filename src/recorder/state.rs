use serde::{Deserialize, Serialize};

/// Lifecycle state of a recording controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Stream request in flight
    AwaitingPermission,
    /// Request refused, capture unsupported, or device lost before recording
    PermissionDenied,
    /// Stream bound, encoder constructed, not recording
    Ready,
    /// An encoder session is running
    Recording,
    /// The encoder session was terminated; chunks are kept for resume
    Paused,
    /// Artifact assembled; `start()` may begin a fresh run
    Stopped,
}

/// Snapshot of the controller's observable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderStatus {
    pub state: SessionState,

    /// A permission request was answered with a grant
    pub asked: bool,

    /// Permission was granted
    pub permission: bool,

    /// An encoder is constructed and can be started
    pub available: bool,

    /// A run is active (true while recording and while paused)
    pub recording: bool,

    pub paused: bool,

    /// Fragments buffered in the current run
    pub chunk_count: usize,

    /// Bytes buffered in the current run
    pub buffered_bytes: usize,

    /// Negotiated encoding format (`""` = host default)
    pub mime_type: Option<String>,
}
