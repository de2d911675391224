//! Session Manager for TabShell.
//!
//! Persists the settings document: home page, window geometry and the tabs
//! that were open at shutdown. Loading never fails hard; whatever goes wrong,
//! the manager ends up holding a usable `Settings`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::platform;
use crate::types::errors::SessionError;
use crate::types::session::TabSnapshot;
use crate::types::settings::{Settings, WindowGeometry};

/// File name of the settings document inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Trait defining session persistence operations.
pub trait SessionManagerTrait {
    fn load(&mut self) -> Result<(), SessionError>;
    fn save(
        &mut self,
        geometry: &WindowGeometry,
        home_url: &str,
        tabs: &[TabSnapshot],
    ) -> Result<(), SessionError>;
    fn settings(&self) -> &Settings;
    fn settings_mut(&mut self) -> &mut Settings;
    fn path(&self) -> &Path;
}

/// Session manager persisting to a JSON file.
pub struct SessionManager {
    path: PathBuf,
    settings: Settings,
}

impl SessionManager {
    /// Creates a `SessionManager` holding default settings.
    ///
    /// If `path_override` is `Some`, that file is used. Otherwise the file is
    /// `settings.json` in the platform data directory.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let path = path_override.unwrap_or_else(|| platform::get_data_dir().join(SETTINGS_FILE));
        Self {
            path,
            settings: Settings::default(),
        }
    }

    /// Writes the current settings as they are.
    pub fn persist(&self) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SessionError::Save(format!("Failed to create data directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| SessionError::Save(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.path, json)
            .map_err(|e| SessionError::Save(format!("Failed to write settings file: {}", e)))?;

        debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

impl SessionManagerTrait for SessionManager {
    /// Loads settings from disk, replacing the in-memory copy.
    ///
    /// A missing file yields defaults. An unreadable or malformed file also
    /// yields defaults, and the failure is returned afterwards.
    fn load(&mut self) -> Result<(), SessionError> {
        self.settings = Settings::default();

        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SessionError::Load(format!("Failed to read settings file: {}", e)))?;

        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => {
                info!(tabs = settings.open_tabs.len(), "loaded settings");
                self.settings = settings;
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path.display(), "settings file is malformed, using defaults: {}", e);
                Err(SessionError::Load(format!("Failed to parse settings file: {}", e)))
            }
        }
    }

    /// Overwrites geometry, home page and open tabs, then writes the file.
    ///
    /// The in-memory settings are updated even when the write fails.
    fn save(
        &mut self,
        geometry: &WindowGeometry,
        home_url: &str,
        tabs: &[TabSnapshot],
    ) -> Result<(), SessionError> {
        self.settings.set_geometry(geometry);
        self.settings.home_url = home_url.to_string();
        self.settings.open_tabs = tabs.to_vec();
        self.persist()
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
