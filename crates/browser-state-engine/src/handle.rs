//! Engine factory, handle and observer traits.

use std::sync::Arc;

use crate::state::EngineState;

/// Factory for live render surfaces.
///
/// Implemented by the embedding rendering engine. The registry calls
/// [`create_handle`](Engine::create_handle) when a session needs a surface
/// and never constructs handles itself.
pub trait Engine: Send + Sync {
    /// Create a new render surface, scoped to the given privacy mode.
    fn create_handle(&self, private: bool) -> Arc<dyn EngineHandle>;
}

/// A live render surface bound to one session.
///
/// Handles are exclusively owned by the registry while linked and must be
/// explicitly [`close`](EngineHandle::close)d when unlinked - they represent
/// live rendering resources, never reclaimed implicitly.
pub trait EngineHandle: Send + Sync {
    /// Start loading the given URL.
    fn load_url(&self, url: &str);

    /// Restore previously saved state onto this surface.
    fn restore_state(&self, state: &EngineState);

    /// Save the current surface state for later restoration.
    fn save_state(&self) -> EngineState;

    /// Register an observer for engine-side events.
    fn register_observer(&self, observer: Arc<dyn EngineObserver>);

    /// Deregister a previously registered observer.
    ///
    /// Observers are matched by pointer identity; deregistering an observer
    /// that was never registered is a no-op.
    fn unregister_observer(&self, observer: &Arc<dyn EngineObserver>);

    /// Release the surface and all resources backing it.
    fn close(&self);
}

/// Callbacks fired by a render surface.
///
/// All methods default to no-ops so implementors only override what they
/// care about.
pub trait EngineObserver: Send + Sync {
    /// The surface navigated to a new URL.
    fn on_location_change(&self, _url: &str) {}

    /// The surface started or finished loading.
    fn on_loading_state_change(&self, _loading: bool) {}
}
