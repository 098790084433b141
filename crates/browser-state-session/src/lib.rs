//! # browser-state-session
//!
//! Concurrency-safe session registry for the browser-state workspace.
//!
//! This crate provides:
//! - `SessionRegistry`, the ordered collection of browsing sessions with a
//!   single selection
//! - Snapshot creation and restoration for process-death recovery
//! - Engine-handle linking and lifecycle management per session
//! - The `RegistryObserver` protocol for UI and other subsystems
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on browser-state-core
//! for session types and on browser-state-engine for the rendering-engine
//! boundary.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod link;
mod selection;

pub mod observer;
pub mod registry;
pub mod snapshot;

// Re-export commonly used types
pub use observer::RegistryObserver;
pub use registry::SessionRegistry;
pub use snapshot::{Snapshot, SnapshotItem};

// Re-export the types callers need alongside the registry
pub use browser_state_core::{Error, Result, Session, SessionId, Thumbnail};
pub use browser_state_engine::{Engine, EngineHandle, EngineObserver, EngineState};
