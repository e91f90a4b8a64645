//! Voice Module
//!
//! Voice cloning from a short reference sample:
//! - Supported output languages
//! - Clone requests, validation and outcomes
//! - The request-to-file pipeline

pub mod cloning;
pub mod language;
pub mod pipeline;

pub use cloning::{
    CloneFailure, CloneOutcome, CloneRequest, CloneRequestBuilder, DEFAULT_OUTPUT_FILE,
};
pub use language::Language;
pub use pipeline::{CloneJob, CloneRequestPipeline};
