//! Snapshot types for process-death recovery.
//!
//! A snapshot is a read-only projection of the registry's ordinary
//! (non-private, non-custom-tab) sessions plus a selected index. Producing
//! one never mutates live state; restoring one consumes it exactly once.
//! Serializing snapshots to durable storage is an external collaborator's
//! responsibility.

use std::fmt;
use std::sync::Arc;

use browser_state_core::Session;
use browser_state_engine::{EngineHandle, EngineState};

/// One restorable session: the session itself plus at most one of a live
/// engine handle or serialized engine state.
#[derive(Clone)]
pub struct SnapshotItem {
    /// The session to restore.
    pub session: Session,

    /// A live render surface to relink on restore.
    pub engine_handle: Option<Arc<dyn EngineHandle>>,

    /// Serialized surface state to restore lazily.
    pub engine_state: Option<EngineState>,
}

impl SnapshotItem {
    /// Create an item carrying neither a handle nor saved state.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            engine_handle: None,
            engine_state: None,
        }
    }

    /// Create an item carrying serialized engine state.
    pub fn with_state(session: Session, state: EngineState) -> Self {
        Self {
            session,
            engine_handle: None,
            engine_state: Some(state),
        }
    }
}

impl fmt::Debug for SnapshotItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotItem")
            .field("session", &self.session)
            .field("has_engine_handle", &self.engine_handle.is_some())
            .field("engine_state", &self.engine_state)
            .finish()
    }
}

/// An ordered collection of restorable sessions plus the selected index.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Restorable sessions in tab order.
    pub items: Vec<SnapshotItem>,

    /// Index of the selected session within `items`.
    pub selected_index: usize,
}

impl Snapshot {
    /// Create a snapshot from items and a selected index.
    pub fn new(items: Vec<SnapshotItem>, selected_index: usize) -> Self {
        Self {
            items,
            selected_index,
        }
    }

    /// The empty-snapshot marker. Restoring it is a no-op.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            selected_index: 0,
        }
    }

    /// Whether this snapshot contains no sessions.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of sessions in this snapshot.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
