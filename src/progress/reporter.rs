//! Background spinner with elapsed time and unit counter
//!
//! The reporter owns its render thread and the shutdown signal. Nothing here
//! is process-global: two reporters never share state.
//!
//! Lifecycle: `Created -> Running -> Stopping -> Stopped`, never backwards.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{ProgressOutput, ProgressSink};

/// Spinner glyphs, one per render tick
pub const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Top bit of the packed state word marks `done`; the rest is the unit count.
const DONE_BIT: u64 = 1 << 63;
const UNIT_MASK: u64 = !DONE_BIT;

/// Reporter configuration
#[derive(Debug, Clone)]
pub struct ReporterOptions {
    /// Delay between two renders
    pub tick_interval: Duration,
    /// Upper bound on how long `stop()` waits for the render thread
    pub join_timeout: Duration,
    /// Text shown next to the spinner
    pub message: String,
    /// What the counter counts ("tokens")
    pub unit_label: String,
    /// Print a final summary line after erasing the spinner
    pub summary: bool,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(120),
            join_timeout: Duration::from_secs(1),
            message: "Generating audio...".to_string(),
            unit_label: "tokens".to_string(),
            summary: true,
        }
    }
}

/// Lifecycle of a reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReporterState {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl ReporterState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// State shared by the render thread (reader) and the generating thread (writer).
///
/// Count and `done` live in one atomic word so an increment can never land
/// after the reporter has been marked done.
#[derive(Debug)]
pub struct ProgressState {
    started: OnceCell<Instant>,
    word: AtomicU64,
}

impl ProgressState {
    fn new() -> Self {
        Self {
            started: OnceCell::new(),
            word: AtomicU64::new(0),
        }
    }

    /// Time since `start()`, zero if never started
    pub fn elapsed(&self) -> Duration {
        self.started
            .get()
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }

    pub fn units(&self) -> u64 {
        self.word.load(Ordering::Acquire) & UNIT_MASK
    }

    pub fn is_done(&self) -> bool {
        self.word.load(Ordering::Acquire) & DONE_BIT != 0
    }

    /// Adds `n` unless done. Returns whether the add happened.
    fn add(&self, n: u64) -> bool {
        self.word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                if word & DONE_BIT != 0 {
                    None
                } else {
                    Some((word & UNIT_MASK).saturating_add(n).min(UNIT_MASK))
                }
            })
            .is_ok()
    }

    fn finish(&self) {
        self.word.fetch_or(DONE_BIT, Ordering::AcqRel);
    }
}

/// Draws the status line through indicatif; shared with the render thread
struct Renderer {
    bar: ProgressBar,
    output: ProgressOutput,
    options: ReporterOptions,
}

impl Renderer {
    fn new(options: ReporterOptions, output: ProgressOutput) -> Self {
        let bar = ProgressBar::with_draw_target(None, output.draw_target())
            .with_style(spinner_style(&options.unit_label))
            .with_message(options.message.clone())
            .with_finish(ProgressFinish::AndClear);
        Self {
            bar,
            output,
            options,
        }
    }

    fn draw(&self, state: &ProgressState) {
        self.bar.set_position(state.units());
        self.bar.tick();
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }

    fn summarize(&self, state: &ProgressState) {
        let secs = state.elapsed().as_secs_f32();
        let text = match state.units() {
            0 => format!("  Finished in {:.1}s\n", secs),
            n => format!("  Generated {} {} in {:.1}s\n", n, self.options.unit_label, secs),
        };
        self.output.emit(&text);
    }
}

/// `  [|]  Generating audio...  |  3.4s elapsed  |  57 tokens  `
fn spinner_style(unit_label: &str) -> ProgressStyle {
    let label = unit_label.to_string();
    let mut ticks = SPINNER_FRAMES.to_vec();
    ticks.push(" ");

    ProgressStyle::default_spinner()
        .template("  [{spinner}]  {msg}  |  {elapsed} elapsed  |  {pos} {unit}  ")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&ticks)
        .with_key(
            "elapsed",
            |state: &indicatif::ProgressState, w: &mut dyn fmt::Write| {
                let _ = write!(w, "{:.1}s", state.elapsed().as_secs_f64());
            },
        )
        .with_key(
            "unit",
            move |_: &indicatif::ProgressState, w: &mut dyn fmt::Write| {
                let _ = w.write_str(&label);
            },
        )
}

struct Worker {
    handle: JoinHandle<()>,
    exited: Receiver<()>,
}

/// Clears the liveness flag when the render thread ends, panics included
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Live spinner for an operation of unknown length.
///
/// ```rust,ignore
/// let reporter = ProgressReporter::new(ReporterOptions::default(), ProgressOutput::Stdout);
/// reporter.start();
/// // ... blocking work, possibly calling reporter.increment(1) from anywhere
/// reporter.stop();
/// ```
pub struct ProgressReporter {
    state: Arc<ProgressState>,
    renderer: Arc<Renderer>,
    phase: AtomicU8,
    worker: Mutex<Option<Worker>>,
    alive: Arc<AtomicBool>,
}

impl ProgressReporter {
    pub fn new(options: ReporterOptions, output: ProgressOutput) -> Self {
        Self {
            state: Arc::new(ProgressState::new()),
            renderer: Arc::new(Renderer::new(options, output)),
            phase: AtomicU8::new(ReporterState::Created as u8),
            worker: Mutex::new(None),
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Reporter that renders nothing
    pub fn hidden() -> Self {
        Self::new(ReporterOptions::default(), ProgressOutput::Hidden)
    }

    pub fn state(&self) -> ReporterState {
        ReporterState::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn units(&self) -> u64 {
        self.state.units()
    }

    pub fn elapsed(&self) -> Duration {
        self.state.elapsed()
    }

    /// Whether the render thread is still executing
    pub fn is_rendering(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Spawn the render thread. Only the first call from `Created` does anything.
    pub fn start(&self) -> bool {
        let mut slot = self.worker.lock();
        if self
            .phase
            .compare_exchange(
                ReporterState::Created as u8,
                ReporterState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return false;
        }

        let _ = self.state.started.set(Instant::now());
        self.renderer.bar.reset_elapsed();

        let (exit_tx, exit_rx) = mpsc::channel();
        let state = Arc::clone(&self.state);
        let renderer = Arc::clone(&self.renderer);
        let alive = Arc::clone(&self.alive);
        alive.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name("mimic-progress".to_string())
            .spawn(move || {
                let _guard = AliveGuard(alive);
                let interval = renderer.options.tick_interval;
                while !state.is_done() {
                    renderer.draw(&state);
                    thread::park_timeout(interval);
                }
                let _ = exit_tx.send(());
            });

        match spawned {
            Ok(handle) => {
                *slot = Some(Worker {
                    handle,
                    exited: exit_rx,
                });
            }
            Err(e) => {
                // Keep running without a display; counting still works.
                self.alive.store(false, Ordering::Release);
                warn!("Could not spawn progress thread: {}", e);
            }
        }
        true
    }

    /// Add `n` units. No-op once the reporter has been stopped.
    pub fn increment(&self, n: u64) {
        self.state.add(n);
    }

    /// Stop rendering, wait (bounded) for the thread, erase the line and
    /// print the summary if enabled.
    ///
    /// Returns `true` for the call that performed the teardown; later calls
    /// are no-ops returning `false`.
    pub fn stop(&self) -> bool {
        self.shutdown(self.renderer.options.summary)
    }

    /// Like [`stop`](Self::stop) but never prints the summary line. Used when
    /// the display ends before the work does.
    pub fn stop_silently(&self) -> bool {
        self.shutdown(false)
    }

    fn shutdown(&self, summary: bool) -> bool {
        let worker = {
            // Serialized with `start()` through the worker slot.
            let mut slot = self.worker.lock();
            match self.state() {
                ReporterState::Created => {
                    self.state.finish();
                    self.phase
                        .store(ReporterState::Stopped as u8, Ordering::Release);
                    return true;
                }
                ReporterState::Running => {
                    self.phase
                        .store(ReporterState::Stopping as u8, Ordering::Release);
                }
                ReporterState::Stopping | ReporterState::Stopped => return false,
            }
            self.state.finish();
            slot.take()
        };

        let mut drained = true;
        if let Some(worker) = worker {
            worker.handle.thread().unpark();
            match worker.exited.recv_timeout(self.renderer.options.join_timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if worker.handle.join().is_err() {
                        warn!("Progress thread panicked");
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // The thread is stuck writing; leave it detached.
                    warn!(
                        "Progress thread did not exit within {:?}, detaching",
                        self.renderer.options.join_timeout
                    );
                    drained = false;
                }
            }
        }

        if drained {
            self.renderer.clear();
            if summary {
                self.renderer.summarize(&self.state);
            }
        }

        debug!(
            units = self.state.units(),
            elapsed_ms = self.state.elapsed().as_millis() as u64,
            "progress reporter stopped"
        );
        self.phase
            .store(ReporterState::Stopped as u8, Ordering::Release);
        true
    }
}

impl ProgressSink for ProgressReporter {
    fn on_progress(&self, delta: u64) {
        self.increment(delta);
    }

    fn on_complete(&self) {
        self.stop();
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("state", &self.state())
            .field("units", &self.units())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SharedBuffer;

    fn fast_options() -> ReporterOptions {
        ReporterOptions {
            tick_interval: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_lifecycle() {
        let reporter = ProgressReporter::hidden();
        assert_eq!(reporter.state(), ReporterState::Created);

        assert!(reporter.start());
        assert_eq!(reporter.state(), ReporterState::Running);
        assert!(!reporter.start());

        assert!(reporter.stop());
        assert_eq!(reporter.state(), ReporterState::Stopped);
        assert!(!reporter.is_rendering());

        // No way back to Running
        assert!(!reporter.start());
        assert_eq!(reporter.state(), ReporterState::Stopped);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let reporter = ProgressReporter::new(fast_options(), ProgressOutput::Hidden);
        reporter.start();
        assert!(reporter.stop());
        assert!(!reporter.stop());
        assert_eq!(reporter.state(), ReporterState::Stopped);
    }

    #[test]
    fn test_stop_before_start() {
        let reporter = ProgressReporter::hidden();
        assert!(reporter.stop());
        assert_eq!(reporter.state(), ReporterState::Stopped);
        assert!(!reporter.start());
        assert!(!reporter.is_rendering());
    }

    #[test]
    fn test_increment_after_stop_is_noop() {
        let reporter = ProgressReporter::hidden();
        reporter.start();
        reporter.increment(3);
        reporter.increment(1);
        reporter.stop();
        reporter.increment(10);
        assert_eq!(reporter.units(), 4);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 10_000;

        let reporter = Arc::new(ProgressReporter::new(fast_options(), ProgressOutput::Hidden));
        reporter.start();

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let reporter = Arc::clone(&reporter);
                thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        reporter.increment(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(reporter.units(), (THREADS * PER_THREAD) as u64);
        reporter.stop();
    }

    #[test]
    fn test_renders_and_erases_line() {
        let buffer = SharedBuffer::new();
        let reporter = ProgressReporter::new(fast_options(), ProgressOutput::Buffer(buffer.clone()));
        reporter.start();
        reporter.increment(7);
        thread::sleep(Duration::from_millis(40));
        reporter.stop();

        let text = buffer.contents();
        assert!(text.starts_with("  ["));
        assert!(text.contains("]  Generating audio...  |  "));
        assert!(text.contains("s elapsed  |  7 tokens"));
        assert!(text.contains("\r  Generated 7 tokens in "));
        assert_eq!(text.matches("Generated").count(), 1);
    }

    #[test]
    fn test_custom_unit_label() {
        let buffer = SharedBuffer::new();
        let options = ReporterOptions {
            message: "Cloning".to_string(),
            unit_label: "frames".to_string(),
            ..fast_options()
        };
        let reporter = ProgressReporter::new(options, ProgressOutput::Buffer(buffer.clone()));
        reporter.start();
        reporter.increment(2);
        thread::sleep(Duration::from_millis(30));
        reporter.stop();

        let text = buffer.contents();
        assert!(text.contains("Cloning  |"));
        assert!(text.contains("2 frames"));
        assert!(text.contains("Generated 2 frames in "));
    }

    #[test]
    fn test_silent_stop_skips_summary() {
        let buffer = SharedBuffer::new();
        let reporter = ProgressReporter::new(fast_options(), ProgressOutput::Buffer(buffer.clone()));
        reporter.start();
        thread::sleep(Duration::from_millis(20));

        assert!(reporter.stop_silently());
        assert!(!reporter.stop());
        assert_eq!(reporter.state(), ReporterState::Stopped);

        let text = buffer.contents();
        assert!(!text.contains("Finished"));
        assert!(!text.contains("Generated"));
        assert!(text.ends_with('\r'));
    }

    #[test]
    fn test_stop_racing_start_always_settles() {
        for _ in 0..200 {
            let reporter = Arc::new(ProgressReporter::new(fast_options(), ProgressOutput::Hidden));
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let starter = {
                let reporter = Arc::clone(&reporter);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    reporter.start()
                })
            };
            barrier.wait();
            let stopped = reporter.stop();
            let started = starter.join().unwrap();

            // Either stop ran first and start was refused, or stop tore the
            // running reporter down; it never loses the race.
            assert!(stopped);
            if started {
                assert!(!reporter.is_rendering());
            }
            assert_eq!(reporter.state(), ReporterState::Stopped);
        }
    }

    #[test]
    fn test_summary_can_be_disabled() {
        let buffer = SharedBuffer::new();
        let options = ReporterOptions {
            summary: false,
            ..fast_options()
        };
        let reporter = ProgressReporter::new(options, ProgressOutput::Buffer(buffer.clone()));
        reporter.start();
        thread::sleep(Duration::from_millis(20));
        reporter.stop();

        let text = buffer.contents();
        assert!(!text.contains("Finished"));
        assert!(text.ends_with('\r'));
    }

    #[test]
    fn test_stop_is_bounded_when_output_stalls() {
        let buffer = SharedBuffer::new();
        let options = ReporterOptions {
            join_timeout: Duration::from_millis(50),
            ..fast_options()
        };
        let reporter = ProgressReporter::new(options, ProgressOutput::Buffer(buffer.clone()));

        let stall = buffer.stall();
        reporter.start();
        thread::sleep(Duration::from_millis(20));

        let begin = Instant::now();
        assert!(reporter.stop());
        assert!(begin.elapsed() < Duration::from_secs(1));
        assert_eq!(reporter.state(), ReporterState::Stopped);

        drop(stall);
        let deadline = Instant::now() + Duration::from_secs(2);
        while reporter.is_rendering() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!reporter.is_rendering());
    }

    #[test]
    fn test_sink_protocol_drives_reporter() {
        let reporter = ProgressReporter::hidden();
        reporter.start();
        let sink: &dyn ProgressSink = &reporter;
        sink.on_progress(5);
        sink.on_progress(2);
        sink.on_complete();
        assert_eq!(reporter.units(), 7);
        assert_eq!(reporter.state(), ReporterState::Stopped);
    }

    #[test]
    fn test_drop_stops_thread() {
        let alive = {
            let reporter = ProgressReporter::new(fast_options(), ProgressOutput::Hidden);
            reporter.start();
            Arc::clone(&reporter.alive)
        };
        assert!(!alive.load(Ordering::Acquire));
    }
}
