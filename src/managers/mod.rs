// TabShell state managers
// Managers handle stateful operations: tabs, the tab collection, bookmarks, the session and shortcuts.

pub mod bookmark_manager;
pub mod session_manager;
pub mod shortcut_manager;
pub mod tab;
pub mod tab_manager;
