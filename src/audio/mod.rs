//! Audio I/O
//!
//! - WAV persistence for generated waveforms
//! - WAV decoding for engine responses and output inspection

mod loader;
mod output;

pub use loader::{decode_wav_bytes, load_wav, read_wav_info, WavInfo};
pub use output::{WavEncoding, WavFileWriter, WaveformWriter};
