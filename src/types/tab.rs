use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Address of an empty, unnavigated tab.
pub const BLANK_PAGE: &str = "about:blank";
/// Title shown for a tab sitting on the blank page.
pub const NEW_TAB_TITLE: &str = "new tab";
/// Title shown while a navigation is in flight.
pub const LOADING_TITLE: &str = "Loading…";
/// Title shown when a navigation fails before any title arrived.
pub const FAILED_TITLE: &str = "Failed to load";

/// Process-unique tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page load progress of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Failed,
}

/// Lifecycle of the engine behind a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Notifications a tab publishes to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    NavigationStarting,
    NavigationCompleted { success: bool },
    TitleChanged(String),
    UrlChanged(String),
}
