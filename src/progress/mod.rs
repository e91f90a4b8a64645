//! Progress reporting for long-running generation
//!
//! - [`ProgressReporter`]: background spinner line with elapsed time and a unit counter
//! - [`ProgressSink`]: the callback protocol handed to generation engines
//! - [`ProgressOutput`]: where the status line goes (terminal, buffer, nowhere)

mod reporter;

use std::io::{self, Write};
use std::sync::Arc;

use indicatif::{ProgressDrawTarget, TermLike};
use parking_lot::Mutex;

pub use reporter::{
    ProgressReporter, ProgressState, ReporterOptions, ReporterState, SPINNER_FRAMES,
};

/// Callbacks an engine may drive while it generates.
///
/// `on_progress` may be called any number of times from the generating
/// thread; `on_complete` once when generation ends, successfully or not.
pub trait ProgressSink: Send + Sync {
    /// `delta` more units (tokens, frames...) have been produced
    fn on_progress(&self, delta: u64);

    /// Generation finished
    fn on_complete(&self);
}

/// Destination for the single updating status line
#[derive(Clone, Default)]
pub enum ProgressOutput {
    #[default]
    Stdout,
    Stderr,
    /// In-memory capture, mostly for tests and GUIs that poll
    Buffer(SharedBuffer),
    /// Render nothing
    Hidden,
}

impl ProgressOutput {
    /// indicatif target the spinner is drawn on
    pub(crate) fn draw_target(&self) -> ProgressDrawTarget {
        match self {
            ProgressOutput::Stdout => ProgressDrawTarget::stdout(),
            ProgressOutput::Stderr => ProgressDrawTarget::stderr(),
            ProgressOutput::Buffer(buffer) => {
                ProgressDrawTarget::term_like(Box::new(BufferTerm(buffer.clone())))
            }
            ProgressOutput::Hidden => ProgressDrawTarget::hidden(),
        }
    }

    /// Best-effort write. Errors are swallowed.
    pub(crate) fn emit(&self, text: &str) {
        let _ = match self {
            ProgressOutput::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
            ProgressOutput::Stderr => {
                let mut out = io::stderr().lock();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
            ProgressOutput::Buffer(buffer) => {
                buffer.inner.lock().extend_from_slice(text.as_bytes());
                Ok(())
            }
            ProgressOutput::Hidden => Ok(()),
        };
    }
}

impl std::fmt::Debug for ProgressOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressOutput::Stdout => write!(f, "Stdout"),
            ProgressOutput::Stderr => write!(f, "Stderr"),
            ProgressOutput::Buffer(_) => write!(f, "Buffer"),
            ProgressOutput::Hidden => write!(f, "Hidden"),
        }
    }
}

/// Cloneable in-memory text sink
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Hold the buffer lock, stalling every writer until the guard drops.
    /// Simulates a terminal that stopped draining.
    pub fn stall(&self) -> parking_lot::MutexGuard<'_, Vec<u8>> {
        self.inner.lock()
    }
}

/// A [`SharedBuffer`] seen as a terminal: line clears become `\r`,
/// cursor movement is ignored.
#[derive(Debug)]
struct BufferTerm(SharedBuffer);

impl BufferTerm {
    fn append(&self, text: &str) -> io::Result<()> {
        self.0.inner.lock().extend_from_slice(text.as_bytes());
        Ok(())
    }
}

impl TermLike for BufferTerm {
    fn width(&self) -> u16 {
        100
    }

    fn move_cursor_up(&self, _n: usize) -> io::Result<()> {
        Ok(())
    }

    fn move_cursor_down(&self, _n: usize) -> io::Result<()> {
        Ok(())
    }

    fn move_cursor_right(&self, _n: usize) -> io::Result<()> {
        Ok(())
    }

    fn move_cursor_left(&self, _n: usize) -> io::Result<()> {
        Ok(())
    }

    fn write_line(&self, s: &str) -> io::Result<()> {
        self.append(s)?;
        self.append("\n")
    }

    fn write_str(&self, s: &str) -> io::Result<()> {
        self.append(s)
    }

    fn clear_line(&self) -> io::Result<()> {
        self.append("\r")
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}
