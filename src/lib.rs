//! # MimicTTS - Voice Cloning Orchestration
//!
//! Clone a voice from a few seconds of reference audio and speak new text
//! with it. The heavy lifting is done by a generation engine (a Qwen3-TTS
//! server by default); this crate validates requests, drives the engine,
//! shows live progress while it works and writes the result to disk.
//!
//! ## Features
//!
//! - **Engine Agnostic**: any [`VoiceCloneEngine`] can be plugged in
//! - **Live Progress**: spinner, elapsed time and token count on a background thread
//! - **Progress Negotiation**: engines that cannot report progress are retried once without it
//! - **Tagged Outcomes**: validation, generation and persistence failures are told apart
//! - **10 Languages**: English, Chinese, Japanese, Korean, German, French, Russian, Spanish, Italian, Portuguese
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mimic_tts::{CloneRequest, CloneRequestPipeline, HttpEngine, HttpEngineConfig};
//!
//! let engine = HttpEngine::connect(HttpEngineConfig::default())?;
//! let pipeline = CloneRequestPipeline::new(Arc::new(engine));
//!
//! let request = CloneRequest::builder()
//!     .text("Hello world")
//!     .reference_audio("speaker.wav")
//!     .reference_text("This is what the speaker says in the sample.")
//!     .language("English")
//!     .output("outputs/hello.wav")
//!     .build()?;
//!
//! match pipeline.run(&request) {
//!     CloneOutcome::Success(path) => println!("saved {}", path.display()),
//!     CloneOutcome::Failure(failure) => eprintln!("{}", failure),
//! }
//! ```
//!
//! ## Custom Engines
//!
//! ```rust,ignore
//! use mimic_tts::engine::{GenerationRequest, GenerationResult, VoiceCloneEngine};
//! use mimic_tts::progress::ProgressSink;
//!
//! struct MyEngine;
//!
//! impl VoiceCloneEngine for MyEngine {
//!     fn id(&self) -> &str { "my-engine" }
//!
//!     fn generate(
//!         &self,
//!         request: &GenerationRequest,
//!         progress: Option<&dyn ProgressSink>,
//!     ) -> mimic_tts::Result<GenerationResult> {
//!         // call progress.on_progress(1) per generated token
//!         todo!()
//!     }
//! }
//! ```

#![allow(missing_docs)]
#![allow(rustdoc::missing_crate_level_docs)]

pub mod audio;
pub mod config;
pub mod core;
pub mod engine;
pub mod progress;
pub mod voice;

// Core re-exports
pub use core::error::{FailureKind, Result, TtsError};

pub use config::{AppConfig, ProgressConfig};

// Engine re-exports
pub use engine::{
    EngineCell, GenerationInvoker, GenerationRequest, GenerationResult, HttpEngine,
    HttpEngineConfig, ProgressSupport, VoiceCloneEngine,
};

// Progress re-exports
pub use progress::{
    ProgressOutput, ProgressReporter, ProgressSink, ReporterOptions, ReporterState,
    SharedBuffer,
};

// Voice module re-exports
pub use voice::{
    CloneFailure, CloneJob, CloneOutcome, CloneRequest, CloneRequestBuilder,
    CloneRequestPipeline, Language,
};

// Audio re-exports
pub use audio::{WavEncoding, WavFileWriter, WaveformWriter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default model served by the inference server
pub const DEFAULT_MODEL_ID: &str = "Qwen/Qwen3-TTS-12Hz-0.6B-Base";
