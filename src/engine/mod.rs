//! Generation engine abstraction
//!
//! This module provides:
//! - `traits`: the black-box voice-clone engine contract
//! - `invoker`: one call per request, with progress negotiation and fallback
//! - `cell`: load-once holder for an expensive engine
//! - `http`: binding to a Qwen3-TTS inference server

pub mod cell;
pub mod http;
pub mod invoker;
pub mod traits;

pub use cell::EngineCell;
pub use http::{HttpEngine, HttpEngineConfig};
pub use invoker::GenerationInvoker;
pub use traits::{GenerationRequest, GenerationResult, ProgressSupport, VoiceCloneEngine};
