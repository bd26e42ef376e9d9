use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::media::{CaptureConstraints, PcmHostConfig};
use crate::recorder::RecorderOptions;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recorder: RecorderOptions,
    pub constraints: CaptureConstraints,
    pub permission: PermissionConfig,
    pub host: PcmHostConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    /// Request capture even when the host origin is not secure
    pub allow_insecure_origin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8740,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub recordings_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            recordings_path: "~/.capture-recorder/recordings".to_string(),
        }
    }
}

impl OutputConfig {
    /// Recordings directory with `~` expanded
    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.recordings_path).as_ref())
    }
}

impl Config {
    /// Load `path` (any format the `config` crate knows, extension optional)
    /// with `CAPTURE_RECORDER__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        Self::build(path, true)
    }

    /// Like `load`, but a missing file yields the defaults
    pub fn load_or_default(path: &str) -> Result<Self> {
        Self::build(path, false)
    }

    fn build(path: &str, required: bool) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(required))
            .add_source(config::Environment::with_prefix("CAPTURE_RECORDER").separator("__"))
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
