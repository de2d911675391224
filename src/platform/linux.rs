// TabShell platform paths for Linux
// Data: $XDG_DATA_HOME/tabshell, falling back to ~/.local/share/tabshell

use std::env;
use std::path::PathBuf;

use super::APP_DIR_NAME_LOWER;

/// Returns the data directory for TabShell on Linux.
pub fn get_data_dir() -> PathBuf {
    data_dir_from(env::var("XDG_DATA_HOME").ok(), env::var("HOME").ok())
}

fn data_dir_from(xdg_data_home: Option<String>, home: Option<String>) -> PathBuf {
    match xdg_data_home.filter(|v| !v.is_empty()) {
        Some(xdg) => PathBuf::from(xdg).join(APP_DIR_NAME_LOWER),
        None => {
            let home = home.unwrap_or_else(|| String::from("/tmp"));
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join(APP_DIR_NAME_LOWER)
        }
    }
}
