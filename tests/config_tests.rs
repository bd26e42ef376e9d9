// Tests for configuration loading

use anyhow::Result;
use capture_recorder::media::{VideoConstraint, VideoDevice};
use capture_recorder::{CaptureCapability, Config};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_file_yields_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("absent");

    let config = Config::load_or_default(path.to_str().unwrap())?;

    assert_eq!(config.recorder.time_slice, Duration::ZERO);
    assert_eq!(
        config.recorder.fallback_types,
        vec!["video/webm;codecs=vp8", "video/webm", ""]
    );
    assert!(config.constraints.audio);
    assert!(config.constraints.wants_video());
    assert!(!config.permission.allow_insecure_origin);
    assert_eq!(config.http.port, 8740);
    assert_eq!(config.host.capability, CaptureCapability::Modern);

    Ok(())
}

#[test]
fn test_load_requires_file() {
    assert!(Config::load("/nonexistent/capture-recorder").is_err());
}

#[test]
fn test_load_toml_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("recorder.toml");
    std::fs::write(
        &path,
        r#"
[recorder]
mime_type = "audio/l16"
time_slice_ms = 250

[constraints]
video = false

[permission]
allow_insecure_origin = true

[host]
capability = "legacy"
sample_rate = 8000

[http]
port = 9000
"#,
    )?;

    let config = Config::load(path.to_str().unwrap())?;

    assert_eq!(config.recorder.mime_type.as_deref(), Some("audio/l16"));
    assert_eq!(config.recorder.time_slice, Duration::from_millis(250));
    // Unset keys keep their defaults
    assert_eq!(config.recorder.fallback_types.len(), 3);
    assert!(config.constraints.audio);
    assert!(!config.constraints.wants_video());
    assert!(config.permission.allow_insecure_origin);
    assert_eq!(config.host.capability, CaptureCapability::Legacy);
    assert_eq!(config.host.sample_rate, 8000);
    assert_eq!(config.host.channels, 1);
    assert_eq!(config.http.port, 9000);
    assert_eq!(config.http.bind, "127.0.0.1");

    Ok(())
}

#[test]
fn test_video_device_table() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("device.toml");
    std::fs::write(
        &path,
        r#"
[constraints.video]
device_id = "cam-1"
width = 1280
"#,
    )?;

    let config = Config::load(path.to_str().unwrap())?;

    assert_eq!(
        config.constraints.video,
        VideoConstraint::Device(VideoDevice {
            device_id: Some("cam-1".to_string()),
            width: Some(1280),
            ..VideoDevice::default()
        })
    );
    assert!(config.constraints.wants_video());

    Ok(())
}

#[test]
fn test_recordings_dir_expands_home() {
    let config = Config::default();
    let dir = config.output.recordings_dir();

    assert!(!dir.to_string_lossy().starts_with('~'));
    assert!(dir.ends_with(".capture-recorder/recordings"));
}
