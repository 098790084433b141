//! Serialized render-surface state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serialized state of a suspended render surface.
///
/// Produced by [`EngineHandle::save_state`](crate::EngineHandle::save_state)
/// and consumed by
/// [`EngineHandle::restore_state`](crate::EngineHandle::restore_state). The
/// registry treats the contents as opaque; engines decide what goes in here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineState {
    values: serde_json::Map<String, Value>,
}

impl EngineState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under the given key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get the value stored under the given key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether any values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
