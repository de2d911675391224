use serde::{Deserialize, Serialize};

/// A tab's displayable state as stored in the settings file.
///
/// Snapshots are built fresh on every save and never hold an engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabSnapshot {
    pub title: String,
    pub url: String,
}

impl TabSnapshot {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}
