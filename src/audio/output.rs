//! Waveform persistence
//!
//! Provides:
//! - [`WaveformWriter`]: the seam the pipeline persists through
//! - [`WavFileWriter`]: mono WAV via hound (16-bit PCM or 32-bit float)
//!
//! The file is staged next to its destination and renamed over it once
//! complete, so a failed write never leaves a truncated WAV behind.

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::core::error::{AudioOperation, Result, TtsError};

const STAGING_PREFIX: &str = ".mimic-";

/// Writes a finished waveform to disk, replacing whatever was there
pub trait WaveformWriter: Send + Sync {
    fn write(&self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<()>;
}

/// Sample encoding used in the WAV container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavEncoding {
    /// 16-bit signed PCM, samples clamped to [-1, 1]
    #[default]
    Pcm16,
    /// 32-bit IEEE float, written as-is
    Float32,
}

/// WAV writer backed by hound
#[derive(Debug, Clone, Default)]
pub struct WavFileWriter {
    encoding: WavEncoding,
}

impl WavFileWriter {
    pub fn new(encoding: WavEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> WavEncoding {
        self.encoding
    }

    fn spec(&self, sample_rate: u32) -> hound::WavSpec {
        match self.encoding {
            WavEncoding::Pcm16 => hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            WavEncoding::Float32 => hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
        }
    }
}

impl WaveformWriter for WavFileWriter {
    fn write(&self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
        let saving = |message: String| TtsError::Audio {
            message,
            operation: AudioOperation::Saving,
            path: Some(path.to_path_buf()),
        };

        if samples.is_empty() {
            return Err(saving("refusing to write an empty waveform".to_string()));
        }
        if sample_rate == 0 {
            return Err(saving("sample rate must be positive".to_string()));
        }

        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| TtsError::Io {
                    message: format!("Failed to create output directory: {}", e),
                    path: Some(parent.to_path_buf()),
                })?;
                parent
            }
            None => Path::new("."),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(".wav");
        // Same mode a plain create would give, umask applied.
        #[cfg(unix)]
        builder.permissions(std::os::unix::fs::PermissionsExt::from_mode(0o666));

        let staged = builder
            .tempfile_in(dir)
            .map_err(|e| TtsError::Io {
                message: format!("Failed to create staging file: {}", e),
                path: Some(dir.to_path_buf()),
            })?;

        let mut writer = hound::WavWriter::new(BufWriter::new(staged.as_file()), self.spec(sample_rate))
            .map_err(|e| saving(format!("Failed to create WAV file: {}", e)))?;

        match self.encoding {
            WavEncoding::Pcm16 => {
                for &sample in samples {
                    let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                    writer.write_sample(scaled).map_err(|e| saving(e.to_string()))?;
                }
            }
            WavEncoding::Float32 => {
                for &sample in samples {
                    writer.write_sample(sample).map_err(|e| saving(e.to_string()))?;
                }
            }
        }

        writer.finalize().map_err(|e| saving(e.to_string()))?;

        // Dropping an unpersisted staging file deletes it.
        staged.persist(path).map_err(|e| TtsError::Io {
            message: format!("Failed to replace output file: {}", e.error),
            path: Some(path.to_path_buf()),
        })?;
        debug!(path = %path.display(), samples = samples.len(), sample_rate, "Waveform written");
        Ok(())
    }
}
