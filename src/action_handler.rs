//! Action dispatch for TabShell.
//!
//! Every user-facing command is a [`ShellAction`]. The chrome web view posts
//! actions as JSON (`{"action": "navigate", "input": "example.com"}`), key
//! chords resolve to actions through the shortcut manager, and both end up in
//! [`handle_action`], which applies the action and then drains pending
//! engine events.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::app::ShellController;
use crate::engine::Viewport;
use crate::managers::shortcut_manager::ShortcutManagerTrait;
use crate::types::settings::WindowGeometry;
use crate::types::tab::TabId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ShellAction {
    NewTab,
    CloseTab { id: TabId },
    CloseSelectedTab,
    SelectTab { index: usize },
    Navigate { input: String },
    GoBack,
    GoForward,
    Reload,
    Stop,
    GoHome,
    ToggleBookmarksPanel,
    SetAsHomepage,
    BookmarkCurrentPage,
    OpenBookmark { index: usize },
    OpenBookmarkInNewTab { index: usize },
    DeleteBookmark { index: usize },
    EditBookmark { index: usize, title: String, url: String },
    ReorderBookmark { from: usize, to: usize },
    ShowAbout,
    UpdateGeometry { geometry: WindowGeometry },
    SetViewport { x: f64, y: f64, width: f64, height: f64 },
}

impl ShellAction {
    /// Resolves a field-less action from its tag, e.g. `"reload"`.
    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(json!({ "action": name })).ok()
    }
}

/// Applies `action` to the shell and delivers the events it caused.
pub fn handle_action(shell: &mut ShellController, action: ShellAction) {
    debug!(?action, "handling action");
    match action {
        ShellAction::NewTab => {
            shell.new_tab();
        }
        ShellAction::CloseTab { id } => shell.close_tab(id),
        ShellAction::CloseSelectedTab => shell.close_selected_tab(),
        ShellAction::SelectTab { index } => shell.select_tab(index),
        ShellAction::Navigate { input } => shell.navigate(&input),
        ShellAction::GoBack => shell.go_back(),
        ShellAction::GoForward => shell.go_forward(),
        ShellAction::Reload => shell.reload(),
        ShellAction::Stop => shell.stop(),
        ShellAction::GoHome => shell.go_home(),
        ShellAction::ToggleBookmarksPanel => shell.toggle_bookmarks_panel(),
        ShellAction::SetAsHomepage => shell.set_as_homepage(),
        ShellAction::BookmarkCurrentPage => shell.bookmark_current_page(),
        ShellAction::OpenBookmark { index } => shell.open_bookmark(index),
        ShellAction::OpenBookmarkInNewTab { index } => shell.open_bookmark_in_new_tab(index),
        ShellAction::DeleteBookmark { index } => shell.delete_bookmark(index),
        ShellAction::EditBookmark { index, title, url } => shell.edit_bookmark(index, &title, &url),
        ShellAction::ReorderBookmark { from, to } => shell.reorder_bookmark(from, to),
        ShellAction::ShowAbout => shell.show_about(),
        ShellAction::UpdateGeometry { geometry } => shell.update_geometry(geometry),
        ShellAction::SetViewport {
            x,
            y,
            width,
            height,
        } => shell.set_viewport(Viewport {
            x,
            y,
            width,
            height,
        }),
    }
    shell.pump_events();
}

/// Parses a JSON action posted by the chrome and applies it.
///
/// Returns `Err` with a description when the message is not a valid action.
pub fn handle_ipc_message(shell: &mut ShellController, message: &str) -> Result<(), String> {
    let action: ShellAction =
        serde_json::from_str(message).map_err(|e| format!("invalid action message: {}", e))?;
    handle_action(shell, action);
    Ok(())
}

/// Resolves a key chord through the shortcut bindings and applies the bound
/// action. Returns false when the chord is not bound.
pub fn handle_key(shell: &mut ShellController, keys: &str) -> bool {
    let Some(action) = shell
        .shortcuts()
        .action_for(keys)
        .and_then(ShellAction::from_name)
    else {
        return false;
    };
    handle_action(shell, action);
    true
}
