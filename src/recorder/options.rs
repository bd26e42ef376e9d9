use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::codec::DEFAULT_FALLBACK_TYPES;

/// Encoding options for a recording controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderOptions {
    /// Preferred MIME type, tried before the fallbacks (empty = none)
    pub mime_type: Option<String>,

    /// Ordered fallbacks; `""` lets the host pick
    pub fallback_types: Vec<String>,

    /// How often the encoder emits a fragment
    /// Default: 0 ms (one fragment when the encoder stops)
    #[serde(rename = "time_slice_ms", with = "millis")]
    pub time_slice: Duration,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            mime_type: None,
            fallback_types: DEFAULT_FALLBACK_TYPES.iter().map(|t| t.to_string()).collect(),
            time_slice: Duration::ZERO,
        }
    }
}

impl RecorderOptions {
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_time_slice(mut self, time_slice: Duration) -> Self {
        self.time_slice = time_slice;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
