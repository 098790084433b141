//! Observer protocol and synchronous fan-out.

use std::sync::{Arc, RwLock};

use browser_state_core::Session;

/// Callbacks fired by the session registry.
///
/// All methods default to no-ops so implementors only override what they
/// care about. Callbacks are delivered synchronously as part of the
/// operation that produced them, after the registry's critical section has
/// ended. Emission order within one operation is preserved; there is no
/// ordering guarantee between distinct observers.
pub trait RegistryObserver: Send + Sync {
    /// A session was added to the registry.
    fn on_session_added(&self, _session: &Session) {}

    /// A session was removed from the registry.
    fn on_session_removed(&self, _session: &Session) {}

    /// The selection moved to the given session.
    fn on_session_selected(&self, _session: &Session) {}

    /// All sessions (or all ordinary sessions) were removed at once.
    fn on_all_sessions_removed(&self) {}

    /// A snapshot was restored into the registry.
    fn on_sessions_restored(&self) {}
}

/// One notification produced by a registry operation.
///
/// Operations collect these under the lock and the registry fans them out
/// after the lock is released.
#[derive(Debug, Clone)]
pub(crate) enum RegistryEvent {
    Added(Session),
    Removed(Session),
    Selected(Session),
    AllRemoved,
    Restored,
}

/// Synchronous multi-subscriber broadcaster.
#[derive(Default)]
pub(crate) struct ObserverSet {
    observers: RwLock<Vec<Arc<dyn RegistryObserver>>>,
}

impl ObserverSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, observer: Arc<dyn RegistryObserver>) {
        self.observers.write().unwrap().push(observer);
    }

    /// Deregister by pointer identity; unknown observers are a no-op.
    pub(crate) fn unregister(&self, observer: &Arc<dyn RegistryObserver>) {
        self.observers
            .write()
            .unwrap()
            .retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub(crate) fn emit(&self, events: &[RegistryEvent]) {
        if events.is_empty() {
            return;
        }

        // Snapshot the subscriber list so observers may (de)register
        // from within a callback.
        let observers: Vec<_> = self.observers.read().unwrap().clone();

        for event in events {
            for observer in &observers {
                match event {
                    RegistryEvent::Added(session) => observer.on_session_added(session),
                    RegistryEvent::Removed(session) => observer.on_session_removed(session),
                    RegistryEvent::Selected(session) => observer.on_session_selected(session),
                    RegistryEvent::AllRemoved => observer.on_all_sessions_removed(),
                    RegistryEvent::Restored => observer.on_sessions_restored(),
                }
            }
        }
    }
}
