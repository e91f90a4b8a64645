//! Single-shot engine invocation with progress negotiation
//!
//! The invoker calls the engine exactly once per request, handing it the
//! reporter as a progress sink when the engine may accept one. An engine that
//! answers with a capability mismatch gets one retry without the sink, and
//! the answer is remembered for this binding so later requests go straight to
//! the sink-less call.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::core::error::{Result, TtsError};
use crate::progress::ProgressReporter;
use super::traits::{GenerationRequest, GenerationResult, ProgressSupport, VoiceCloneEngine};

const SUPPORT_UNKNOWN: u8 = 0;
const SUPPORT_YES: u8 = 1;
const SUPPORT_NO: u8 = 2;

/// Stops the reporter on every exit path, unwinding included
struct StopOnDrop<'a>(&'a ProgressReporter);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Calls a bound engine, attaching progress when supported
pub struct GenerationInvoker {
    engine: Arc<dyn VoiceCloneEngine>,
    support: AtomicU8,
}

impl GenerationInvoker {
    pub fn new(engine: Arc<dyn VoiceCloneEngine>) -> Self {
        let support = match engine.progress_support() {
            ProgressSupport::Supported => SUPPORT_YES,
            ProgressSupport::Unsupported => SUPPORT_NO,
            ProgressSupport::Unknown => SUPPORT_UNKNOWN,
        };
        Self {
            engine,
            support: AtomicU8::new(support),
        }
    }

    pub fn engine(&self) -> &Arc<dyn VoiceCloneEngine> {
        &self.engine
    }

    /// What is currently known about the engine's sink support
    pub fn progress_support(&self) -> ProgressSupport {
        match self.support.load(Ordering::Acquire) {
            SUPPORT_YES => ProgressSupport::Supported,
            SUPPORT_NO => ProgressSupport::Unsupported,
            _ => ProgressSupport::Unknown,
        }
    }

    /// Run one generation. The reporter is stopped before this returns,
    /// whatever the outcome.
    pub fn invoke(
        &self,
        request: &GenerationRequest,
        reporter: &ProgressReporter,
    ) -> Result<GenerationResult> {
        let _teardown = StopOnDrop(reporter);
        let start = Instant::now();

        let result = if self.progress_support() == ProgressSupport::Unsupported {
            // Nothing will be counted; a summary now would predate the work.
            reporter.stop_silently();
            self.generate_unattended(request)
        } else {
            match self.engine.generate(request, Some(reporter)) {
                Ok(result) => {
                    self.support.store(SUPPORT_YES, Ordering::Release);
                    Ok(result)
                }
                Err(e) if e.is_capability_mismatch() => {
                    reporter.stop_silently();
                    warn!(
                        engine = self.engine.id(),
                        "Engine does not accept a progress sink, retrying without it"
                    );
                    self.support.store(SUPPORT_NO, Ordering::Release);
                    self.generate_unattended(request)
                }
                Err(e) => Err(e),
            }
        };

        let result = result.and_then(|r| self.check(r))?;
        info!(
            engine = self.engine.id(),
            samples = result.samples.len(),
            sample_rate = result.sample_rate,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generation finished"
        );
        Ok(result)
    }

    /// Second and final attempt: no sink, no further retries.
    fn generate_unattended(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        debug!(engine = self.engine.id(), "Generating without progress sink");
        self.engine.generate(request, None).map_err(|e| {
            if e.is_capability_mismatch() {
                TtsError::generation(
                    self.engine.id(),
                    format!("engine rejected the call without a progress sink: {}", e),
                )
            } else {
                e
            }
        })
    }

    fn check(&self, result: GenerationResult) -> Result<GenerationResult> {
        if result.sample_rate == 0 {
            return Err(TtsError::generation(
                self.engine.id(),
                "engine returned a sample rate of 0 Hz",
            ));
        }
        Ok(result)
    }
}
