//! # browser-state-core
//!
//! Core types for the browser-state session registry.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other browser-state crates. It provides:
//!
//! - Session types (SessionId, Session, Thumbnail)
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other browser-state crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all modules
pub mod error;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use session::{Session, SessionId, Thumbnail};
