//! Load-once holder for an expensive engine
//!
//! Loading a voice-clone model takes seconds to minutes. An [`EngineCell`]
//! runs the loader at most once even when several threads ask at the same
//! time; later callers get the same `Arc`. A failed load leaves the cell
//! empty so the next caller can try again.

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::core::error::Result;
use super::traits::VoiceCloneEngine;

/// Single-initialization slot for a shared engine
#[derive(Default)]
pub struct EngineCell {
    slot: OnceCell<Arc<dyn VoiceCloneEngine>>,
}

impl EngineCell {
    pub const fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// Cell that already holds `engine`
    pub fn with_engine(engine: Arc<dyn VoiceCloneEngine>) -> Self {
        let cell = Self::new();
        let _ = cell.slot.set(engine);
        cell
    }

    /// Return the engine, running `load` if nobody has yet.
    ///
    /// Concurrent first callers block until the single in-flight load ends.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<dyn VoiceCloneEngine>>
    where
        F: FnOnce() -> Result<Arc<dyn VoiceCloneEngine>>,
    {
        self.slot
            .get_or_try_init(|| {
                let start = Instant::now();
                let engine = load()?;
                info!(
                    engine = engine.id(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Engine loaded"
                );
                Ok(engine)
            })
            .map(Arc::clone)
    }

    /// The engine, if loaded
    pub fn get(&self) -> Option<Arc<dyn VoiceCloneEngine>> {
        self.slot.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use crate::core::error::TtsError;
    use crate::engine::{GenerationRequest, GenerationResult};
    use crate::progress::ProgressSink;

    struct Dummy;

    impl VoiceCloneEngine for Dummy {
        fn id(&self) -> &str {
            "dummy"
        }

        fn generate(
            &self,
            _request: &GenerationRequest,
            _progress: Option<&dyn ProgressSink>,
        ) -> Result<GenerationResult> {
            Ok(GenerationResult::new(vec![0.0; 8], 8000))
        }
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let cell = Arc::new(EngineCell::new());
        let loads = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let loads = Arc::clone(&loads);
                thread::spawn(move || {
                    cell.get_or_load(|| {
                        loads.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(30));
                        Ok(Arc::new(Dummy) as Arc<dyn VoiceCloneEngine>)
                    })
                    .unwrap()
                })
            })
            .collect();

        let engines: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        for engine in &engines[1..] {
            assert!(Arc::ptr_eq(&engines[0], engine));
        }
    }

    #[test]
    fn test_failed_load_can_be_retried() {
        let cell = EngineCell::new();
        let err = cell
            .get_or_load(|| {
                Err(TtsError::ModelLoad {
                    component: "dummy".to_string(),
                    message: "weights missing".to_string(),
                })
            })
            .err()
            .unwrap();
        assert!(err.to_string().contains("weights missing"));
        assert!(!cell.is_loaded());

        let engine = cell
            .get_or_load(|| Ok(Arc::new(Dummy) as Arc<dyn VoiceCloneEngine>))
            .unwrap();
        assert_eq!(engine.id(), "dummy");
        assert!(cell.is_loaded());
    }

    #[test]
    fn test_preloaded_cell() {
        let cell = EngineCell::with_engine(Arc::new(Dummy));
        let engine = cell
            .get_or_load(|| panic!("loader must not run"))
            .unwrap();
        assert_eq!(engine.id(), "dummy");
    }
}
