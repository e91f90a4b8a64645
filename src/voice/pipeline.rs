//! Request-to-file pipeline
//!
//! `validate -> start reporter -> invoke engine -> persist -> outcome`.
//! Every run is one fresh generation; nothing is cached between runs.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use once_cell::unsync::OnceCell;
use tracing::{info, warn};

use crate::audio::{WavFileWriter, WaveformWriter};
use crate::core::error::{Result, TtsError};
use crate::engine::{GenerationInvoker, GenerationRequest, VoiceCloneEngine};
use crate::progress::{ProgressOutput, ProgressReporter, ReporterOptions};
use super::cloning::{CloneFailure, CloneOutcome, CloneRequest};

/// Top-level contract from request to persisted output
///
/// The pipeline does not serialize concurrent `run` calls. An engine that
/// is not reentrant must be guarded by the caller.
pub struct CloneRequestPipeline {
    invoker: GenerationInvoker,
    writer: Arc<dyn WaveformWriter>,
    reporter_options: ReporterOptions,
    output: ProgressOutput,
}

impl CloneRequestPipeline {
    pub fn new(engine: Arc<dyn VoiceCloneEngine>) -> Self {
        Self {
            invoker: GenerationInvoker::new(engine),
            writer: Arc::new(WavFileWriter::default()),
            reporter_options: ReporterOptions::default(),
            output: ProgressOutput::default(),
        }
    }

    /// Persist through a different writer
    pub fn with_writer(mut self, writer: Arc<dyn WaveformWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_reporter_options(mut self, options: ReporterOptions) -> Self {
        self.reporter_options = options;
        self
    }

    /// Where each run's status line is drawn
    pub fn with_progress_output(mut self, output: ProgressOutput) -> Self {
        self.output = output;
        self
    }

    pub fn invoker(&self) -> &GenerationInvoker {
        &self.invoker
    }

    /// A fresh, unstarted reporter configured like the ones `run` uses
    pub fn new_reporter(&self) -> ProgressReporter {
        ProgressReporter::new(self.reporter_options.clone(), self.output.clone())
    }

    /// Validate, generate and persist one request.
    pub fn run(&self, request: &CloneRequest) -> CloneOutcome {
        let generation = match request.validate() {
            Ok(generation) => generation,
            Err(e) => return self.rejected(e),
        };
        let reporter = self.new_reporter();
        self.execute(&generation, &request.output_path, &reporter)
            .into()
    }

    /// Same as [`run`](Self::run) but drives a caller-supplied reporter,
    /// which is stopped before this returns on every path.
    pub fn run_with_reporter(
        &self,
        request: &CloneRequest,
        reporter: &ProgressReporter,
    ) -> CloneOutcome {
        let generation = match request.validate() {
            Ok(generation) => generation,
            Err(e) => {
                reporter.stop();
                return self.rejected(e);
            }
        };
        self.execute(&generation, &request.output_path, reporter)
            .into()
    }

    /// Run on a worker thread. The returned handle can be waited on with a
    /// deadline; a job that misses it keeps running and its result is dropped.
    pub fn spawn(self: &Arc<Self>, request: CloneRequest) -> CloneJob {
        let (tx, rx) = mpsc::channel();
        let pipeline = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("mimic-clone".to_string())
            .spawn(move || {
                let outcome = pipeline.run(&request);
                let _ = tx.send(outcome);
            });

        match spawned {
            Ok(handle) => CloneJob {
                outcome: rx,
                received: OnceCell::new(),
                handle: Some(handle),
            },
            Err(e) => {
                let (tx, rx) = mpsc::channel();
                let _ = tx.send(CloneOutcome::Failure(
                    TtsError::Internal {
                        message: format!("could not spawn clone worker: {}", e),
                    }
                    .into(),
                ));
                CloneJob {
                    outcome: rx,
                    received: OnceCell::new(),
                    handle: None,
                }
            }
        }
    }

    fn execute(
        &self,
        request: &GenerationRequest,
        output_path: &Path,
        reporter: &ProgressReporter,
    ) -> Result<PathBuf> {
        info!(
            engine = self.invoker.engine().id(),
            language = %request.language,
            chars = request.text.chars().count(),
            "Starting voice clone"
        );
        reporter.start();
        let result = self.invoker.invoke(request, reporter).map_err(|e| {
            warn!(error = %e, "Generation failed");
            e
        })?;

        self.writer
            .write(output_path, &result.samples, result.sample_rate)
            .map_err(|e| {
                warn!(path = %output_path.display(), error = %e, "Could not save output");
                e
            })?;

        info!(
            path = %output_path.display(),
            duration_secs = result.duration(),
            "Voice clone saved"
        );
        Ok(output_path.to_path_buf())
    }

    fn rejected(&self, err: TtsError) -> CloneOutcome {
        warn!(error = %err, "Clone request rejected");
        CloneOutcome::Failure(err.into())
    }
}

/// Handle to a pipeline run on a worker thread
///
/// The outcome is sent once; whichever accessor receives it first keeps it,
/// so every later call sees the same value.
pub struct CloneJob {
    outcome: Receiver<CloneOutcome>,
    received: OnceCell<CloneOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl CloneJob {
    /// Block until the run finishes
    pub fn wait(mut self) -> CloneOutcome {
        let outcome = match self.received.take() {
            Some(outcome) => outcome,
            None => self.outcome.recv().unwrap_or_else(|_| lost()),
        };
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        outcome
    }

    /// Wait at most `timeout`. `None` means the deadline passed; the run is
    /// not interrupted.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<CloneOutcome> {
        if let Some(outcome) = self.received.get() {
            return Some(outcome.clone());
        }
        match self.outcome.recv_timeout(timeout) {
            Ok(outcome) => Some(self.keep(outcome)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.keep(lost())),
        }
    }

    /// Outcome if the run already finished
    pub fn try_outcome(&self) -> Option<CloneOutcome> {
        if let Some(outcome) = self.received.get() {
            return Some(outcome.clone());
        }
        match self.outcome.try_recv() {
            Ok(outcome) => Some(self.keep(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.keep(lost())),
        }
    }

    fn keep(&self, outcome: CloneOutcome) -> CloneOutcome {
        self.received.get_or_init(|| outcome).clone()
    }
}

fn lost() -> CloneOutcome {
    CloneOutcome::Failure(CloneFailure::from(TtsError::Internal {
        message: "clone worker exited without an outcome".to_string(),
    }))
}
