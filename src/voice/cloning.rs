//! Voice cloning requests and outcomes
//!
//! A [`CloneRequest`] is what a front end (CLI, GUI form, API handler)
//! collects; [`CloneRequest::validate`] turns it into the engine-facing
//! [`GenerationRequest`] or a validation error.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{FailureKind, Result, TtsError};
use crate::engine::GenerationRequest;
use super::language::Language;

/// Output path used when the caller gives none
pub const DEFAULT_OUTPUT_FILE: &str = "outputs/result.wav";

fn default_x_vector_only() -> bool {
    true
}

/// One voice-clone job as submitted by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneRequest {
    /// Text the cloned voice should speak
    pub text: String,
    /// Reference voice sample (3-15 s works best)
    pub reference_audio: PathBuf,
    /// Exact transcript of the reference sample
    pub reference_text: String,
    /// Language name or ISO code, checked against [`Language::ALL`]
    pub language: String,
    /// Destination WAV file, overwritten if present
    pub output_path: PathBuf,
    /// Clone from the speaker embedding only
    #[serde(default = "default_x_vector_only")]
    pub x_vector_only: bool,
}

impl CloneRequest {
    pub fn new(
        text: impl Into<String>,
        reference_audio: impl Into<PathBuf>,
        reference_text: impl Into<String>,
        language: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            text: text.into(),
            reference_audio: reference_audio.into(),
            reference_text: reference_text.into(),
            language: language.into(),
            output_path: output_path.into(),
            x_vector_only: true,
        }
    }

    pub fn builder() -> CloneRequestBuilder {
        CloneRequestBuilder::new()
    }

    /// Check every field and build the engine request.
    ///
    /// Touches the filesystem only to open the reference audio.
    pub fn validate(&self) -> Result<GenerationRequest> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(TtsError::validation("text", "text to speak cannot be empty"));
        }

        let reference_text = self.reference_text.trim();
        if reference_text.is_empty() {
            return Err(TtsError::validation(
                "reference_text",
                "reference transcript cannot be empty",
            ));
        }

        let language: Language = self.language.parse()?;

        check_readable(&self.reference_audio)?;

        if self.output_path.as_os_str().is_empty() {
            return Err(TtsError::validation("output_path", "output path cannot be empty"));
        }

        Ok(GenerationRequest {
            text: text.to_string(),
            language,
            reference_audio: self.reference_audio.clone(),
            reference_text: reference_text.to_string(),
            x_vector_only: self.x_vector_only,
        })
    }
}

fn check_readable(path: &Path) -> Result<()> {
    let invalid = |message: String| TtsError::validation("reference_audio", message);

    let metadata = std::fs::metadata(path)
        .map_err(|_| invalid(format!("reference audio not found: {}", path.display())))?;
    if !metadata.is_file() {
        return Err(invalid(format!(
            "reference audio is not a file: {}",
            path.display()
        )));
    }
    File::open(path).map_err(|e| {
        invalid(format!(
            "reference audio is not readable: {} ({})",
            path.display(),
            e
        ))
    })?;
    Ok(())
}

/// Fluent construction of a [`CloneRequest`]
pub struct CloneRequestBuilder {
    text: Option<String>,
    reference_audio: Option<PathBuf>,
    reference_text: Option<String>,
    language: String,
    output_path: PathBuf,
    x_vector_only: bool,
}

impl CloneRequestBuilder {
    pub fn new() -> Self {
        Self {
            text: None,
            reference_audio: None,
            reference_text: None,
            language: Language::default().name().to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            x_vector_only: true,
        }
    }

    /// Set text to speak
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set reference audio path
    pub fn reference_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_audio = Some(path.into());
        self
    }

    /// Set reference transcript
    pub fn reference_text(mut self, text: impl Into<String>) -> Self {
        self.reference_text = Some(text.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Enable x-vector mode
    pub fn x_vector(mut self, enable: bool) -> Self {
        self.x_vector_only = enable;
        self
    }

    /// Build the request. Field contents are checked later by `validate`.
    pub fn build(self) -> Result<CloneRequest> {
        let text = self
            .text
            .ok_or_else(|| TtsError::validation("text", "text to speak is required"))?;
        let reference_audio = self.reference_audio.ok_or_else(|| {
            TtsError::validation("reference_audio", "reference audio path is required")
        })?;
        let reference_text = self.reference_text.ok_or_else(|| {
            TtsError::validation("reference_text", "reference transcript is required")
        })?;

        Ok(CloneRequest {
            text,
            reference_audio,
            reference_text,
            language: self.language,
            output_path: self.output_path,
            x_vector_only: self.x_vector_only,
        })
    }
}

impl Default for CloneRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a run failed, tagged by class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl std::fmt::Display for CloneFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failure: {}", self.kind, self.reason)
    }
}

impl From<TtsError> for CloneFailure {
    fn from(err: TtsError) -> Self {
        Self {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    /// Waveform written to this path
    Success(PathBuf),
    Failure(CloneFailure),
}

impl CloneOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CloneOutcome::Success(_))
    }

    pub fn output_path(&self) -> Option<&Path> {
        match self {
            CloneOutcome::Success(path) => Some(path),
            CloneOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CloneFailure> {
        match self {
            CloneOutcome::Success(_) => None,
            CloneOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> std::result::Result<PathBuf, CloneFailure> {
        match self {
            CloneOutcome::Success(path) => Ok(path),
            CloneOutcome::Failure(failure) => Err(failure),
        }
    }
}

impl From<Result<PathBuf>> for CloneOutcome {
    fn from(result: Result<PathBuf>) -> Self {
        match result {
            Ok(path) => CloneOutcome::Success(path),
            Err(err) => CloneOutcome::Failure(err.into()),
        }
    }
}
