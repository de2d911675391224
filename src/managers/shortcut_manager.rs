//! Shortcut Manager for TabShell.
//!
//! Maps key chords such as `Ctrl+W` to shell action names, with conflict
//! detection and platform-specific modifier key adaptation. Action names are
//! the `action` tags of [`crate::action_handler::ShellAction`].

use std::collections::HashMap;

use crate::types::errors::ShortcutError;

const MODIFIER_ORDER: [&str; 4] = ["Ctrl", "Cmd", "Alt", "Shift"];

/// Trait defining shortcut management operations.
pub trait ShortcutManagerTrait {
    fn register_shortcut(&mut self, action: &str, keys: &str) -> Result<(), ShortcutError>;
    fn unregister_shortcut(&mut self, action: &str) -> Result<(), ShortcutError>;
    fn get_shortcut(&self, action: &str) -> Option<&str>;
    fn action_for(&self, keys: &str) -> Option<&str>;
    fn list_shortcuts(&self) -> &HashMap<String, String>;
    fn reset_to_defaults(&mut self);
    fn has_conflict(&self, keys: &str, exclude_action: Option<&str>) -> Option<String>;
    fn get_default_shortcuts(&self) -> HashMap<String, String>;
}

/// Shortcut manager with in-memory storage and platform adaptation.
pub struct ShortcutManager {
    shortcuts: HashMap<String, String>,
}

impl ShortcutManager {
    pub fn new() -> Self {
        let mut mgr = Self {
            shortcuts: HashMap::new(),
        };
        mgr.shortcuts = mgr.get_default_shortcuts();
        mgr
    }

    /// Adapts modifier keys for the current platform.
    pub fn adapt_for_platform(keys: &str) -> String {
        if cfg!(target_os = "macos") {
            keys.replace("Ctrl+", "Cmd+")
        } else {
            keys.to_string()
        }
    }

    /// Canonical spelling of a chord: modifiers in a fixed order, then the
    /// key. Returns `None` for an empty chord or one made only of modifiers.
    pub fn normalize_keys(keys: &str) -> Option<String> {
        let mut modifiers: Vec<&str> = Vec::new();
        let mut key: Option<String> = None;

        for part in keys.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            let modifier = match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => Some("Ctrl"),
                "cmd" | "meta" | "command" => Some("Cmd"),
                "alt" | "option" => Some("Alt"),
                "shift" => Some("Shift"),
                _ => None,
            };
            match modifier {
                Some(m) if !modifiers.contains(&m) => modifiers.push(m),
                Some(_) => {}
                None if key.is_none() => key = Some(capitalize(part)),
                None => return None,
            }
        }

        let key = key?;
        modifiers.sort_by_key(|m| MODIFIER_ORDER.iter().position(|o| o == m));
        let mut parts: Vec<String> = modifiers.into_iter().map(str::to_string).collect();
        parts.push(key);
        Some(parts.join("+"))
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutManagerTrait for ShortcutManager {
    fn register_shortcut(&mut self, action: &str, keys: &str) -> Result<(), ShortcutError> {
        let normalized = Self::normalize_keys(keys)
            .ok_or_else(|| ShortcutError::InvalidKeys(format!("'{}'", keys)))?;

        if let Some(conflicting_action) = self.has_conflict(&normalized, Some(action)) {
            return Err(ShortcutError::Conflict(format!(
                "'{}' is already bound to '{}'",
                keys, conflicting_action
            )));
        }

        let adapted = Self::adapt_for_platform(&normalized);
        self.shortcuts.insert(action.to_string(), adapted);
        Ok(())
    }

    fn unregister_shortcut(&mut self, action: &str) -> Result<(), ShortcutError> {
        self.shortcuts
            .remove(action)
            .map(|_| ())
            .ok_or_else(|| ShortcutError::NotFound(action.to_string()))
    }

    fn get_shortcut(&self, action: &str) -> Option<&str> {
        self.shortcuts.get(action).map(|s| s.as_str())
    }

    /// Looks up the action bound to a chord as reported by the UI.
    fn action_for(&self, keys: &str) -> Option<&str> {
        let normalized = Self::normalize_keys(keys)?;
        self.shortcuts
            .iter()
            .find(|(_, bound)| **bound == normalized)
            .map(|(action, _)| action.as_str())
    }

    fn list_shortcuts(&self) -> &HashMap<String, String> {
        &self.shortcuts
    }

    fn reset_to_defaults(&mut self) {
        self.shortcuts = self.get_default_shortcuts();
    }

    fn has_conflict(&self, keys: &str, exclude_action: Option<&str>) -> Option<String> {
        let adapted = Self::adapt_for_platform(keys);
        self.shortcuts
            .iter()
            .filter(|(action, _)| Some(action.as_str()) != exclude_action)
            .find(|(_, bound)| **bound == adapted)
            .map(|(action, _)| action.clone())
    }

    fn get_default_shortcuts(&self) -> HashMap<String, String> {
        let defaults = [
            ("close_selected_tab", "Ctrl+W"),
            ("toggle_bookmarks_panel", "Ctrl+B"),
            ("show_about", "F1"),
            ("new_tab", "Ctrl+T"),
            ("reload", "F5"),
            ("stop", "Escape"),
            ("go_back", "Alt+Left"),
            ("go_forward", "Alt+Right"),
            ("go_home", "Alt+Home"),
        ];

        defaults
            .into_iter()
            .map(|(a, k)| (a.to_string(), Self::adapt_for_platform(k)))
            .collect()
    }
}
