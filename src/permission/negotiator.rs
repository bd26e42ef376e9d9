use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::{DenialError, NegotiationError, NegotiationResult};
use crate::media::{CaptureCapability, CaptureConstraints, CaptureHost, StreamHandle};

/// Requests a capture stream from the host, at most once
pub struct PermissionNegotiator {
    host: Arc<dyn CaptureHost>,

    /// Proceed (with a warning) when the origin is not secure
    allow_insecure_origin: bool,

    /// Whether the host has been contacted
    asked: AtomicBool,
}

impl PermissionNegotiator {
    pub fn new(host: Arc<dyn CaptureHost>) -> Self {
        Self {
            host,
            allow_insecure_origin: false,
            asked: AtomicBool::new(false),
        }
    }

    pub fn allow_insecure_origin(mut self, allow: bool) -> Self {
        self.allow_insecure_origin = allow;
        self
    }

    /// Whether a request has already been issued to the host
    pub fn has_asked(&self) -> bool {
        self.asked.load(Ordering::SeqCst)
    }

    /// Validate the host environment without contacting the user
    pub fn check_environment(&self) -> NegotiationResult<CaptureCapability> {
        let capability = self.host.capability();
        if capability == CaptureCapability::None {
            warn!("Host doesn't support a capture request API");
            return Err(NegotiationError::UnsupportedEnvironment);
        }

        let origin = self.host.origin();
        if !origin.is_secure() {
            warn!(
                "Capture must run from a secure origin (https or localhost), got {}",
                origin
            );
            if !self.allow_insecure_origin {
                return Err(NegotiationError::InsecureOrigin {
                    origin: origin.to_string(),
                });
            }
        }

        Ok(capability)
    }

    /// Request a stream matching `constraints`
    ///
    /// Issues exactly one request per negotiator; the outcome is never retried.
    pub async fn request_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> NegotiationResult<StreamHandle> {
        let capability = self.check_environment()?;

        if self.asked.swap(true, Ordering::SeqCst) {
            warn!("Stream already requested by this negotiator");
            return Err(NegotiationError::AlreadyRequested);
        }

        info!("Requesting capture stream ({:?} API): {:?}", capability, constraints);

        let outcome = match capability {
            CaptureCapability::Modern => self.host.request_stream(constraints).await,
            CaptureCapability::Legacy => self.request_legacy(constraints).await?,
            CaptureCapability::None => return Err(NegotiationError::UnsupportedEnvironment),
        };

        match outcome {
            Ok(stream) => {
                info!("Capture stream granted: {}", stream.id());
                Ok(stream)
            }
            Err(e) => {
                warn!("Capture stream denied: {}", e);
                Err(NegotiationError::Denied(e))
            }
        }
    }

    /// Bridge the callback-style request into a single-fire channel
    async fn request_legacy(
        &self,
        constraints: &CaptureConstraints,
    ) -> NegotiationResult<Result<StreamHandle, DenialError>> {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let failure_tx = Arc::clone(&tx);

        self.host.request_stream_legacy(
            constraints,
            Box::new(move |stream| {
                if let Some(tx) = tx.lock().take() {
                    let _ = tx.send(Ok(stream));
                }
            }),
            Box::new(move |e| {
                if let Some(tx) = failure_tx.lock().take() {
                    let _ = tx.send(Err(e));
                }
            }),
        );

        rx.await.map_err(|_| NegotiationError::Aborted)
    }
}
