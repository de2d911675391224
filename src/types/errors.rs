use std::fmt;

use super::tab::TabId;

// === TabError ===

/// Errors related to tab operations.
#[derive(Debug)]
pub enum TabError {
    /// The requested address cannot be navigated to.
    InvalidUrl(String),
    /// The tab has already released its engine.
    Disposed(TabId),
    /// The engine rejected the request.
    Engine(EngineError),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::InvalidUrl(url) => write!(f, "Invalid URL: '{}'", url),
            TabError::Disposed(id) => write!(f, "Tab already disposed: {}", id),
            TabError::Engine(err) => write!(f, "Tab engine error: {}", err),
        }
    }
}

impl std::error::Error for TabError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TabError::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for TabError {
    fn from(err: EngineError) -> Self {
        TabError::Engine(err)
    }
}

// === EngineError ===

/// Errors reported by an embedded browser engine.
#[derive(Debug)]
pub enum EngineError {
    /// The engine has not finished initializing.
    NotReady,
    /// The engine could not be created.
    Creation(String),
    /// A navigation request was rejected.
    Navigation(String),
    /// Releasing the engine failed. Always swallowed by the owning tab.
    Teardown(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotReady => write!(f, "Engine is not initialized"),
            EngineError::Creation(msg) => write!(f, "Engine creation failed: {}", msg),
            EngineError::Navigation(msg) => write!(f, "Engine navigation failed: {}", msg),
            EngineError::Teardown(msg) => write!(f, "Engine teardown failed: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

// === BookmarkError ===

/// Errors related to bookmark persistence.
#[derive(Debug)]
pub enum BookmarkError {
    /// The bookmark file could not be read or parsed.
    Load(String),
    /// The bookmark file could not be written.
    Save(String),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::Load(msg) => write!(f, "Failed to load bookmarks: {}", msg),
            BookmarkError::Save(msg) => write!(f, "Failed to save bookmarks: {}", msg),
        }
    }
}

impl std::error::Error for BookmarkError {}

// === SessionError ===

/// Errors related to settings and session persistence.
#[derive(Debug)]
pub enum SessionError {
    /// The settings file could not be read or parsed. Defaults are in effect.
    Load(String),
    /// The settings file could not be written.
    Save(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Load(msg) => write!(f, "Failed to load settings: {}", msg),
            SessionError::Save(msg) => write!(f, "Failed to save settings: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

// === ShortcutError ===

/// Errors related to keyboard shortcut management.
#[derive(Debug)]
pub enum ShortcutError {
    /// No binding exists for the given key chord.
    NotFound(String),
    /// The key chord is already bound to another action.
    Conflict(String),
    /// The provided key combination is invalid.
    InvalidKeys(String),
}

impl fmt::Display for ShortcutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortcutError::NotFound(keys) => write!(f, "Shortcut not found: {}", keys),
            ShortcutError::Conflict(msg) => write!(f, "Shortcut conflict: {}", msg),
            ShortcutError::InvalidKeys(keys) => write!(f, "Invalid shortcut keys: {}", keys),
        }
    }
}

impl std::error::Error for ShortcutError {}
