//! # browser-state-engine
//!
//! Rendering-engine boundary for the browser-state session registry.
//!
//! This crate provides:
//! - The `Engine` factory and `EngineHandle` traits the registry consumes
//! - The `EngineObserver` callback trait for engine-side events
//! - `EngineState`, the serialized form of a suspended render surface
//! - `MemoryEngine`, an in-process engine for tests and headless embedders
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it is consumed by
//! browser-state-session and carries no internal dependencies of its own.
//! The real rendering engine lives outside this workspace; embedders
//! implement the traits here to plug it in.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handle;
pub mod memory;
pub mod state;

// Re-export commonly used types
pub use handle::{Engine, EngineHandle, EngineObserver};
pub use memory::{MemoryEngine, MemoryEngineHandle};
pub use state::EngineState;
