use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::media::l16_params;

/// The assembled output of one `stop()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedArtifact {
    pub id: Uuid,

    /// Container type the data is tagged with
    pub mime_type: String,

    /// Concatenated fragments, in emission order
    #[serde(skip)]
    pub data: Vec<u8>,

    /// Number of fragments the artifact was assembled from
    pub chunk_count: usize,

    pub created_at: DateTime<Utc>,
}

impl RecordedArtifact {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>, chunk_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type: mime_type.into(),
            data,
            chunk_count,
            created_at: Utc::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File extension matching the artifact's type
    pub fn extension(&self) -> &'static str {
        if l16_params(&self.mime_type).is_some() {
            return "wav";
        }

        match self.mime_type.as_str() {
            "video/webm" | "audio/webm" => "webm",
            "video/mp4" | "audio/mp4" => "mp4",
            "audio/ogg" => "ogg",
            _ => "bin",
        }
    }

    /// Write the artifact to `path`
    ///
    /// L16 artifacts are wrapped in a WAV container; anything else is written
    /// verbatim.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create output directory")?;
        }

        match l16_params(&self.mime_type) {
            Some((sample_rate, channels)) => self.write_wav(&path, sample_rate, channels)?,
            None => {
                let mut file = BufWriter::new(
                    File::create(&path)
                        .with_context(|| format!("Failed to create {:?}", path))?,
                );
                file.write_all(&self.data)
                    .context("Failed to write artifact")?;
                file.flush()?;
            }
        }

        info!(
            "Saved artifact {} ({} bytes, {}) to {}",
            self.id,
            self.size(),
            self.mime_type,
            path.display()
        );
        Ok(path)
    }

    fn write_wav(&self, path: &Path, sample_rate: u32, channels: u16) -> Result<()> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        for pair in self.data.chunks_exact(2) {
            writer
                .write_sample(i16::from_be_bytes([pair[0], pair[1]]))
                .context("Failed to write sample to WAV")?;
        }

        writer.finalize().context("Failed to finalize WAV file")?;
        Ok(())
    }
}
