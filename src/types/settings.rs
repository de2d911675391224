use serde::{Deserialize, Deserializer, Serialize};

use super::session::TabSnapshot;

/// Home page used when no settings file exists or it cannot be read.
pub const DEFAULT_HOME_URL: &str = "https://www.google.com";

pub const DEFAULT_WINDOW_WIDTH: f64 = 1200.0;
pub const DEFAULT_WINDOW_HEIGHT: f64 = 800.0;
pub const DEFAULT_WINDOW_LEFT: f64 = 100.0;
pub const DEFAULT_WINDOW_TOP: f64 = 100.0;

/// Persisted shell settings: home page, window placement and the open tabs.
///
/// Missing fields take their defaults so older files keep loading; unknown
/// fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub home_url: String,
    pub window_width: f64,
    pub window_height: f64,
    pub window_left: f64,
    pub window_top: f64,
    pub window_state: WindowState,
    #[serde(deserialize_with = "null_as_empty")]
    pub open_tabs: Vec<TabSnapshot>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home_url: DEFAULT_HOME_URL.to_string(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            window_left: DEFAULT_WINDOW_LEFT,
            window_top: DEFAULT_WINDOW_TOP,
            window_state: WindowState::Normal,
            open_tabs: Vec::new(),
        }
    }
}

impl Settings {
    /// Returns the stored window placement.
    pub fn geometry(&self) -> WindowGeometry {
        WindowGeometry {
            width: self.window_width,
            height: self.window_height,
            left: self.window_left,
            top: self.window_top,
            state: self.window_state,
        }
    }

    pub fn set_geometry(&mut self, geometry: &WindowGeometry) {
        self.window_width = geometry.width;
        self.window_height = geometry.height;
        self.window_left = geometry.left;
        self.window_top = geometry.top;
        self.window_state = geometry.state;
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TabSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<TabSnapshot>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Window show state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

/// Window size and position in logical pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WindowGeometry {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
    pub state: WindowState,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Settings::default().geometry()
    }
}
