// TabShell platform abstraction
// Resolves the per-user data directory where bookmarks and settings live.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Directory name used on Windows and macOS.
pub const APP_DIR_NAME: &str = "TabShell";

/// Directory name used on Linux and other XDG platforms.
pub const APP_DIR_NAME_LOWER: &str = "tabshell";

/// Returns the platform-specific data directory for TabShell.
///
/// - **Linux**: `~/.local/share/tabshell` (or `$XDG_DATA_HOME/tabshell`)
/// - **macOS**: `~/Library/Application Support/TabShell`
/// - **Windows**: `%APPDATA%/TabShell`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        std::env::temp_dir().join(APP_DIR_NAME_LOWER)
    }
}
