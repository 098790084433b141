//! Per-session engine attachment.
//!
//! Each registry entry carries an [`EngineLink`]: either nothing, a live
//! render surface with its registered observer, or serialized state waiting
//! to be restored onto the next surface. The tagged union makes "at most one
//! of {live handle, saved state}" a structural guarantee.

use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use browser_state_core::SessionId;
use browser_state_engine::{EngineHandle, EngineObserver, EngineState};

use crate::registry::RegistryState;

/// Engine attachment of one session.
pub(crate) enum EngineLink {
    /// No engine resources attached.
    None,
    /// A live render surface, exclusively owned while linked.
    Live {
        handle: Arc<dyn EngineHandle>,
        observer: Arc<dyn EngineObserver>,
    },
    /// Serialized state pending restoration onto the next surface.
    Saved(EngineState),
}

impl EngineLink {
    /// The live handle, if one is attached.
    pub(crate) fn handle(&self) -> Option<Arc<dyn EngineHandle>> {
        match self {
            EngineLink::Live { handle, .. } => Some(Arc::clone(handle)),
            _ => None,
        }
    }

    /// The pending serialized state, if any.
    pub(crate) fn saved_state(&self) -> Option<&EngineState> {
        match self {
            EngineLink::Saved(state) => Some(state),
            _ => None,
        }
    }

    /// Take the pending serialized state, leaving the link empty.
    pub(crate) fn take_saved_state(&mut self) -> Option<EngineState> {
        if matches!(self, EngineLink::Saved(_)) {
            match std::mem::replace(self, EngineLink::None) {
                EngineLink::Saved(state) => Some(state),
                _ => unreachable!(),
            }
        } else {
            None
        }
    }
}

/// Internal engine observer registered on every linked handle.
///
/// Writes engine-side location changes back into the owning session's entry.
/// Holds only a weak reference so a dropped registry never keeps a handle
/// callback path alive.
pub(crate) struct LinkObserver {
    state: Weak<Mutex<RegistryState>>,
    session_id: SessionId,
}

impl LinkObserver {
    pub(crate) fn new(state: Weak<Mutex<RegistryState>>, session_id: SessionId) -> Self {
        Self { state, session_id }
    }
}

impl EngineObserver for LinkObserver {
    fn on_location_change(&self, url: &str) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.lock().unwrap();
        if let Some(entry) = state
            .entries
            .iter_mut()
            .find(|e| e.session.id() == &self.session_id)
        {
            debug!(
                "Engine reported location change: id={}, url={}",
                self.session_id, url
            );
            entry.session.url = url.to_string();
        }
    }
}
