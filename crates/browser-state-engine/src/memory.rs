//! In-process reference engine.
//!
//! `MemoryEngine` renders nothing: it records the URL it was asked to load
//! and fires observer callbacks synchronously. It backs the registry's test
//! suite and is usable by headless embedders that need session bookkeeping
//! without a real rendering engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::handle::{Engine, EngineHandle, EngineObserver};
use crate::state::EngineState;

/// Engine factory producing [`MemoryEngineHandle`]s.
#[derive(Debug, Default)]
pub struct MemoryEngine;

impl MemoryEngine {
    /// Create a new in-process engine.
    pub fn new() -> Self {
        Self
    }

    /// Create a handle with its concrete type exposed.
    ///
    /// Useful when a caller needs to inspect the handle (current URL,
    /// closed flag) while the registry holds it as a trait object.
    pub fn create_memory_handle(&self, private: bool) -> Arc<MemoryEngineHandle> {
        debug!("Creating memory engine handle: private={}", private);
        Arc::new(MemoryEngineHandle {
            private,
            url: Mutex::new(String::new()),
            closed: AtomicBool::new(false),
            observers: Mutex::new(Vec::new()),
        })
    }
}

impl Engine for MemoryEngine {
    fn create_handle(&self, private: bool) -> Arc<dyn EngineHandle> {
        self.create_memory_handle(private)
    }
}

/// In-process render surface.
///
/// Tracks the current URL, privacy mode, closed flag and registered
/// observers. `load_url` records the URL and fires `on_location_change`
/// synchronously, which is enough to exercise every registry path that
/// touches the engine boundary.
pub struct MemoryEngineHandle {
    private: bool,
    url: Mutex<String>,
    closed: AtomicBool,
    observers: Mutex<Vec<Arc<dyn EngineObserver>>>,
}

impl MemoryEngineHandle {
    /// Whether this handle was created in private mode.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// The URL most recently loaded or restored.
    pub fn current_url(&self) -> String {
        self.url.lock().unwrap().clone()
    }

    /// Whether [`close`](EngineHandle::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    fn notify_location_change(&self, url: &str) {
        let observers: Vec<_> = self.observers.lock().unwrap().clone();
        for observer in observers {
            observer.on_location_change(url);
        }
    }
}

impl std::fmt::Debug for MemoryEngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngineHandle")
            .field("private", &self.private)
            .field("url", &self.current_url())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl EngineHandle for MemoryEngineHandle {
    fn load_url(&self, url: &str) {
        debug!("Memory engine loading URL: {}", url);
        *self.url.lock().unwrap() = url.to_string();
        self.notify_location_change(url);
    }

    fn restore_state(&self, state: &EngineState) {
        if let Some(url) = state.get("url").and_then(Value::as_str) {
            debug!("Memory engine restoring state: url={}", url);
            *self.url.lock().unwrap() = url.to_string();
        }
    }

    fn save_state(&self) -> EngineState {
        let mut state = EngineState::new();
        state.insert("url", self.current_url());
        state
    }

    fn register_observer(&self, observer: Arc<dyn EngineObserver>) {
        self.observers.lock().unwrap().push(observer);
    }

    fn unregister_observer(&self, observer: &Arc<dyn EngineObserver>) {
        let mut observers = self.observers.lock().unwrap();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
    }

    fn close(&self) {
        debug!("Closing memory engine handle");
        self.closed.store(true, Ordering::SeqCst);
        self.observers.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingObserver {
        locations: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                locations: Mutex::new(Vec::new()),
            })
        }
    }

    impl EngineObserver for RecordingObserver {
        fn on_location_change(&self, url: &str) {
            self.locations.lock().unwrap().push(url.to_string());
        }
    }

    #[test]
    fn test_create_handle_privacy() {
        let engine = MemoryEngine::new();
        assert!(engine.create_memory_handle(true).is_private());
        assert!(!engine.create_memory_handle(false).is_private());
    }

    #[test]
    fn test_load_url_notifies_observers() {
        let engine = MemoryEngine::new();
        let handle = engine.create_handle(false);

        let observer = RecordingObserver::new();
        handle.register_observer(observer.clone());

        handle.load_url("https://example.org");
        handle.load_url("https://example.org/page");

        let locations = observer.locations.lock().unwrap();
        assert_eq!(
            *locations,
            vec![
                "https://example.org".to_string(),
                "https://example.org/page".to_string()
            ]
        );
    }

    #[test]
    fn test_unregister_observer() {
        let engine = MemoryEngine::new();
        let handle = engine.create_handle(false);

        let observer = RecordingObserver::new();
        let as_dyn: Arc<dyn EngineObserver> = observer.clone();
        handle.register_observer(as_dyn.clone());
        handle.unregister_observer(&as_dyn);

        handle.load_url("https://example.org");
        assert!(observer.locations.lock().unwrap().is_empty());
    }

    #[test]
    fn test_save_restore_state_round_trip() {
        let engine = MemoryEngine::new();
        let handle = engine.create_handle(false);
        handle.load_url("https://example.org/article");

        let state = handle.save_state();

        let restored = engine.create_handle(false);
        restored.restore_state(&state);

        // Downcast not available through the trait object; verify via state
        assert_eq!(
            restored.save_state().get("url").and_then(Value::as_str),
            Some("https://example.org/article")
        );
    }

    #[test]
    fn test_close_clears_observers() {
        let engine = MemoryEngine::new();
        let handle = engine.create_handle(false);

        let observer = RecordingObserver::new();
        handle.register_observer(observer.clone());
        handle.close();

        handle.load_url("https://example.org");
        assert!(observer.locations.lock().unwrap().is_empty());
    }
}
