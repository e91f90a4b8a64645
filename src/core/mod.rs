//! Core abstractions shared by every other module
//!
//! - `error`: the crate error enum and its failure classes

pub mod error;

pub use error::{AudioOperation, FailureKind, Result, TtsError};
