//! WAV decoding
//!
//! Engines that answer with an encoded file (the HTTP binding) and tests that
//! inspect persisted output both go through here.

use std::io::{Cursor, Read};
use std::path::Path;

use crate::core::error::{AudioOperation, Result, TtsError};

/// Header facts about a WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    /// Frames (samples per channel)
    pub frames: u32,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

/// Read the header of a WAV file without decoding samples
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path).map_err(|e| TtsError::Audio {
        message: e.to_string(),
        operation: AudioOperation::Decoding,
        path: Some(path.to_path_buf()),
    })?;
    let spec = reader.spec();
    Ok(WavInfo {
        frames: reader.duration(),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
    })
}

/// Decode an in-memory WAV file to mono f32 samples
pub fn decode_wav_bytes(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    decode_wav(Cursor::new(bytes))
}

/// Decode a WAV file from disk to mono f32 samples
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| TtsError::Io {
        message: e.to_string(),
        path: Some(path.as_ref().to_path_buf()),
    })?;
    decode_wav(std::io::BufReader::new(file))
}

fn decode_wav<R: Read>(source: R) -> Result<(Vec<f32>, u32)> {
    let decoding = |e: hound::Error| TtsError::Audio {
        message: e.to_string(),
        operation: AudioOperation::Decoding,
        path: None,
    };

    let reader = hound::WavReader::new(source).map_err(decoding)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(decoding)?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<std::result::Result<_, _>>()
                .map_err(decoding)?
        }
    };

    // Downmix to mono
    let mono = if spec.channels > 1 {
        samples
            .chunks(spec.channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, frames: &[[i16; 2]]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for frame in frames {
                for &s in &frame[..spec.channels as usize] {
                    writer.write_sample(s).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_mono_int16() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, &[[16384, 0], [-16384, 0], [0, 0]]);
        let (samples, rate) = decode_wav_bytes(&bytes).unwrap();
        assert_eq!(rate, 24000);
        assert_eq!(samples, vec![0.5, -0.5, 0.0]);
    }

    #[test]
    fn test_decode_downmixes_stereo() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, &[[16384, 0], [16384, 16384]]);
        let (samples, _) = decode_wav_bytes(&bytes).unwrap();
        assert_eq!(samples, vec![0.25, 0.5]);
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_wav_bytes(b"not a wav file").unwrap_err();
        assert!(matches!(
            err,
            TtsError::Audio {
                operation: AudioOperation::Decoding,
                ..
            }
        ));
    }
}
