//! Contract for voice-clone generation engines
//!
//! An engine is a black box: text plus a reference sample in, waveform out.
//! Progress callbacks are optional and negotiated per binding.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::progress::ProgressSink;
use crate::voice::Language;

/// Core trait for all voice-clone engines
///
/// `generate` blocks the calling thread for the whole generation. An engine
/// that cannot drive a [`ProgressSink`] must return
/// [`TtsError::CapabilityMismatch`](crate::core::error::TtsError::CapabilityMismatch)
/// when handed one, and otherwise behave exactly as if called without it.
pub trait VoiceCloneEngine: Send + Sync {
    /// Short engine identifier used in logs and errors
    fn id(&self) -> &str;

    /// Whether `generate` accepts a progress sink
    fn progress_support(&self) -> ProgressSupport {
        ProgressSupport::Unknown
    }

    /// Produce a complete waveform or fail; no partial results
    fn generate(
        &self,
        request: &GenerationRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<GenerationResult>;
}

/// Answer to "does this engine take a progress sink?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSupport {
    Supported,
    Unsupported,
    /// Find out by trying once
    Unknown,
}

/// What the engine is asked to produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text to speak
    pub text: String,
    /// Output language
    pub language: Language,
    /// Reference voice sample
    pub reference_audio: PathBuf,
    /// Exact transcript of the reference sample
    pub reference_text: String,
    /// Condition on the speaker embedding only
    pub x_vector_only: bool,
}

/// Waveform produced by one generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Mono samples, nominally in [-1, 1]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl GenerationResult {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}
