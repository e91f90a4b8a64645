//! Structured error handling for MimicTTS
//!
//! One error enum covers the whole crate. Each variant maps onto a
//! [`FailureKind`] so callers can tell a rejected request apart from a
//! failed generation or a failed write.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias with TtsError
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type for MimicTTS
#[derive(Error, Debug, Clone)]
pub enum TtsError {
    /// Request field missing, empty or unsupported
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The engine refused an optional argument (the progress sink).
    ///
    /// Handled inside the invoker; never returned from a pipeline run.
    #[error("Engine does not accept argument '{argument}'")]
    CapabilityMismatch {
        argument: String,
    },

    /// The generation engine failed
    #[error("Generation error in {engine}: {message}")]
    Generation {
        engine: String,
        message: String,
    },

    /// Engine or model could not be loaded
    #[error("Model loading error in {component}: {message}")]
    ModelLoad {
        component: String,
        message: String,
    },

    /// Audio encoding/decoding errors
    #[error("Audio processing error ({operation}): {message}")]
    Audio {
        message: String,
        operation: AudioOperation,
        path: Option<PathBuf>,
    },

    /// I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Internal/bug errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl TtsError {
    /// Shorthand for a validation error on a named field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        TtsError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    /// Shorthand for a generation failure reported by `engine`
    pub fn generation(engine: impl Into<String>, message: impl Into<String>) -> Self {
        TtsError::Generation {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// Which class of failure this is, from the caller's point of view
    pub fn kind(&self) -> FailureKind {
        match self {
            TtsError::Validation { .. } => FailureKind::Validation,
            TtsError::CapabilityMismatch { .. }
            | TtsError::Generation { .. }
            | TtsError::ModelLoad { .. } => FailureKind::Generation,
            TtsError::Audio { .. } | TtsError::Io { .. } => FailureKind::Persistence,
            TtsError::Config { .. } => FailureKind::Configuration,
            TtsError::Internal { .. } => FailureKind::Generation,
        }
    }

    pub fn is_capability_mismatch(&self) -> bool {
        matches!(self, TtsError::CapabilityMismatch { .. })
    }
}

/// Failure classes surfaced to whoever renders the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request rejected before the engine was called
    Validation,
    /// The engine failed (or could not be loaded)
    Generation,
    /// Writing the waveform failed
    Persistence,
    /// Bad configuration
    Configuration,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Validation => write!(f, "validation"),
            FailureKind::Generation => write!(f, "generation"),
            FailureKind::Persistence => write!(f, "persistence"),
            FailureKind::Configuration => write!(f, "configuration"),
        }
    }
}

/// Audio operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOperation {
    Decoding,
    Saving,
}

impl fmt::Display for AudioOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioOperation::Decoding => write!(f, "decoding"),
            AudioOperation::Saving => write!(f, "saving"),
        }
    }
}
