use tracing::{info, warn};

use crate::media::EncoderFactory;

/// Built-in preference list tried after the caller's format
pub const DEFAULT_FALLBACK_TYPES: [&str; 3] = ["video/webm;codecs=vp8", "video/webm", ""];

/// Artifact type used when the encoder does not report one
pub const DEFAULT_ARTIFACT_TYPE: &str = "video/webm";

/// Build the ordered candidate list: the preferred type (if non-empty) first
pub fn candidate_types(preferred: Option<&str>, fallbacks: &[String]) -> Vec<String> {
    let mut types = Vec::with_capacity(fallbacks.len() + 1);
    if let Some(preferred) = preferred.filter(|t| !t.is_empty()) {
        types.push(preferred.to_string());
    }
    types.extend(fallbacks.iter().cloned());
    types
}

/// Pick the first candidate the factory supports
///
/// The empty string means "let the host choose" and is always accepted; it is
/// also the result when no candidate matches.
pub fn negotiate(factory: &dyn EncoderFactory, candidates: &[String]) -> String {
    for candidate in candidates {
        if candidate.is_empty() {
            info!("Using host default encoding format");
            return String::new();
        }

        if factory.is_type_supported(candidate) {
            info!("Negotiated encoding format: {}", candidate);
            return candidate.clone();
        }

        warn!("{} is not supported by the encoder", candidate);
    }

    warn!("No listed encoding format supported, falling back to host default");
    String::new()
}

/// Top-level media type of a MIME string, parameters stripped and lowercased
///
/// `video/webm;codecs=vp8` -> `video/webm`
pub fn container_type(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
