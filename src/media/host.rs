use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constraints::CaptureConstraints;
use super::stream::StreamHandle;
use crate::error::DenialError;
use crate::recorder::ChunkSink;

/// Which capture-request entry points the host exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureCapability {
    /// Promise-style request (`request_stream`)
    Modern,
    /// Callback-style request (`request_stream_legacy`)
    Legacy,
    /// No capture API at all
    None,
}

/// Transport origin the host is running the capture request from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub protocol: String,
    pub hostname: String,
}

impl Origin {
    pub fn new(protocol: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            hostname: hostname.into(),
        }
    }

    /// Parse `scheme://host[:port][/path]`; a bare host is treated as `https`
    pub fn parse(origin: &str) -> Self {
        let (protocol, rest) = match origin.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => ("https".to_string(), origin),
        };

        let authority = rest.split('/').next().unwrap_or_default();
        let hostname = if let Some(stripped) = authority.strip_prefix('[') {
            // [::1]:8080
            stripped.split(']').next().unwrap_or_default().to_string()
        } else {
            authority.split(':').next().unwrap_or_default().to_string()
        };

        Self {
            protocol,
            hostname: hostname.to_ascii_lowercase(),
        }
    }

    /// Encrypted transport, or a loopback host
    pub fn is_secure(&self) -> bool {
        let protocol = self.protocol.trim_end_matches(':');
        protocol == "https"
            || matches!(
                self.hostname.as_str(),
                "localhost" | "127.0.0.1" | "::1"
            )
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.protocol.trim_end_matches(':'), self.hostname)
    }
}

/// One-shot callbacks for the legacy request style
pub type StreamSuccess = Box<dyn FnOnce(StreamHandle) + Send>;
pub type StreamFailure = Box<dyn FnOnce(DenialError) + Send>;

/// Host capture capability
///
/// Implementations:
/// - `PcmCaptureHost`: a decoded file or synthetic tone served as a live stream
/// - test fakes with scripted outcomes
#[async_trait::async_trait]
pub trait CaptureHost: Send + Sync {
    fn origin(&self) -> Origin;

    fn capability(&self) -> CaptureCapability;

    /// Modern request: resolves once with a stream or a denial
    async fn request_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<StreamHandle, DenialError>;

    /// Legacy request: exactly one of the callbacks is eventually invoked
    fn request_stream_legacy(
        &self,
        constraints: &CaptureConstraints,
        on_success: StreamSuccess,
        on_failure: StreamFailure,
    );
}

/// Options passed when constructing an encoder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Negotiated MIME type; `None` lets the host choose
    pub mime_type: Option<String>,
}

/// Host encoder capability (constructor plus static type check)
pub trait EncoderFactory: Send + Sync {
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Construct an encoder bound to `stream`; the encoder is created idle
    fn create(&self, stream: &StreamHandle, options: EncoderOptions)
        -> Result<Box<dyn MediaEncoder>>;
}

/// An encoder bound to one stream
///
/// Like the host primitive it models, it can only be started once and
/// stopped; there is no in-place pause.
pub trait MediaEncoder: Send {
    /// MIME type the encoder actually produces, if known
    fn mime_type(&self) -> Option<String>;

    /// Begin emitting fragments into `sink`, one every `time_slice`
    /// (`Duration::ZERO` = a single fragment at stop)
    fn start(&mut self, time_slice: Duration, sink: ChunkSink) -> Result<()>;

    /// Stop emitting; pending data must be delivered to the sink before this returns
    fn stop(&mut self) -> Result<()>;

    /// Get encoder name for logging
    fn name(&self) -> &str;
}
