//! Error types for browser-state operations.

use thiserror::Error;

use crate::SessionId;

/// Main error type for session registry operations.
///
/// These variants cover well-formed-but-invalid caller input. Internal
/// invariant violations (a recorded parent id that no longer resolves, a
/// snapshot selection that points at nothing) are registry bugs and panic
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum Error {
    /// Session not found in the registry
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// Parent session given to `add` is not present in the registry
    #[error("Parent session not found: {0}")]
    InvalidParent(SessionId),

    /// No session is currently selected
    #[error("No session is selected")]
    NotSelected,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
