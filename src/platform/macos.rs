// TabShell platform paths for macOS
// Data: ~/Library/Application Support/TabShell

use std::env;
use std::path::PathBuf;

use super::APP_DIR_NAME;

/// Returns the data directory for TabShell on macOS.
pub fn get_data_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
        .join("Library")
        .join("Application Support")
        .join(APP_DIR_NAME)
}
