//! Session types for the browsing-session registry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a browsing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cached render blob for a session (e.g. a tab thumbnail).
///
/// Droppable at any time under memory pressure; never correctness-critical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail(pub Vec<u8>);

impl Thumbnail {
    /// Size of the cached blob in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the blob is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One browsing context (tab).
///
/// A leaf data record: identity, current URL, privacy and custom-tab flags,
/// an optional parent back-reference and an optional cached thumbnail. The
/// `private` and `custom_tab` flags are fixed at creation; everything else
/// is mutated by the owning registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier
    id: SessionId,

    /// Current URL
    pub url: String,

    /// Whether this session is in private browsing mode
    private: bool,

    /// Whether this session is a custom tab (not part of the ordinary tab strip)
    custom_tab: bool,

    /// Identifier of the session that opened this one, if any
    pub parent_id: Option<SessionId>,

    /// Cached thumbnail, droppable under memory pressure
    pub thumbnail: Option<Thumbnail>,
}

impl Session {
    /// Create an ordinary session for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_flags(url, false, false)
    }

    /// Create a private-mode session for the given URL.
    pub fn new_private(url: impl Into<String>) -> Self {
        Self::with_flags(url, true, false)
    }

    /// Create a custom-tab session for the given URL.
    pub fn new_custom_tab(url: impl Into<String>) -> Self {
        Self::with_flags(url, false, true)
    }

    /// Create a session with explicit privacy and custom-tab flags.
    pub fn with_flags(url: impl Into<String>, private: bool, custom_tab: bool) -> Self {
        Self {
            id: SessionId::new(),
            url: url.into(),
            private,
            custom_tab,
            parent_id: None,
            thumbnail: None,
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Whether this session is in private browsing mode.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Whether this session is a custom tab.
    pub fn is_custom_tab(&self) -> bool {
        self.custom_tab
    }
}
