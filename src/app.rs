//! Shell controller for TabShell.
//!
//! Central struct owning the tab collection, the bookmark and session stores
//! and the chrome state (address bar, status line, window title, bookmarks
//! panel). It runs on the UI thread only; engines talk to it through the
//! event channel drained by [`ShellController::pump_events`].

use std::fmt::Display;
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::engine::{event_channel, EngineFactory, EngineMessage, Viewport};
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait, BOOKMARKS_FILE};
use crate::managers::session_manager::{SessionManager, SessionManagerTrait, SETTINGS_FILE};
use crate::managers::shortcut_manager::ShortcutManager;
use crate::managers::tab_manager::{CollectionEvent, TabManager, TabManagerTrait};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{EngineError, TabError};
use crate::types::settings::WindowGeometry;
use crate::types::tab::{LoadingState, TabEvent, TabId, BLANK_PAGE};

pub const STATUS_LOADING: &str = "Loading page...";
pub const STATUS_DONE: &str = "Done";
pub const STATUS_FAILED: &str = "Failed to load page";

/// Product name shown in the about notice and the window title.
pub const PRODUCT_NAME: &str = "TabShell";

/// Startup options.
#[derive(Debug, Clone, Default)]
pub struct ShellConfig {
    /// Directory holding `bookmarks.json` and `settings.json`. Defaults to the
    /// platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Address opened in a new tab after the restored session.
    pub startup_url: Option<String>,
}

/// What the chrome around the content area shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromeState {
    pub address: String,
    pub status: String,
    pub window_title: String,
    pub bookmarks_panel_visible: bool,
}

impl Default for ChromeState {
    fn default() -> Self {
        Self {
            address: String::new(),
            status: STATUS_DONE.to_string(),
            window_title: PRODUCT_NAME.to_string(),
            bookmarks_panel_visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AboutInfo {
    pub name: String,
    pub version: String,
}

impl AboutInfo {
    pub fn current() -> Self {
        Self {
            name: PRODUCT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Message the UI layer should surface to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum Notice {
    Error(String),
    Info(String),
    About(AboutInfo),
}

/// One entry of the tab strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
    pub id: TabId,
    pub title: String,
    pub url: String,
    pub loading_state: LoadingState,
    pub selected: bool,
}

/// Serializable picture of the whole chrome, for UI layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellView {
    pub tabs: Vec<TabView>,
    pub selected_index: Option<usize>,
    pub chrome: ChromeState,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub home_url: String,
    pub bookmarks: Vec<Bookmark>,
    pub geometry: WindowGeometry,
}

/// Normalizes address bar input into a navigable URL.
///
/// Input is trimmed; empty input yields `None`. Anything not starting with
/// `http://` or `https://` gets `https://` in front.
pub fn normalize_address(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{}", trimmed))
    }
}

/// The browser shell.
pub struct ShellController {
    tabs: TabManager,
    bookmarks: BookmarkManager,
    session: SessionManager,
    shortcuts: ShortcutManager,
    engine_rx: UnboundedReceiver<EngineMessage>,
    tab_tx: UnboundedSender<(TabId, TabEvent)>,
    tab_rx: UnboundedReceiver<(TabId, TabEvent)>,
    chrome: ChromeState,
    geometry: WindowGeometry,
    notices: Vec<Notice>,
    shut_down: bool,
}

impl ShellController {
    /// Startup sequence: load settings and bookmarks, restore the window
    /// geometry and the saved tabs (or one home tab), then open the startup
    /// address if one was given.
    ///
    /// Load failures never abort startup; they are queued as notices.
    pub fn boot(config: ShellConfig, factory: Rc<dyn EngineFactory>) -> Self {
        let (engine_tx, engine_rx) = event_channel();
        let (tab_tx, tab_rx) = mpsc::unbounded_channel();

        let bookmarks = BookmarkManager::new(config.data_dir.as_ref().map(|d| d.join(BOOKMARKS_FILE)));
        let session = SessionManager::new(config.data_dir.as_ref().map(|d| d.join(SETTINGS_FILE)));

        let mut shell = Self {
            tabs: TabManager::new(factory, engine_tx),
            bookmarks,
            session,
            shortcuts: ShortcutManager::new(),
            engine_rx,
            tab_tx,
            tab_rx,
            chrome: ChromeState::default(),
            geometry: WindowGeometry::default(),
            notices: Vec::new(),
            shut_down: false,
        };

        if let Err(e) = shell.session.load() {
            shell.report("load settings", e);
        }
        if let Err(e) = shell.bookmarks.load() {
            shell.report("load bookmarks", e);
        }
        shell.geometry = shell.session.settings().geometry();

        let saved = shell.session.settings().open_tabs.clone();
        if saved.is_empty() {
            let home = shell.session.settings().home_url.clone();
            shell.open_tab(&home, None);
        } else {
            for snapshot in &saved {
                shell.open_tab(&snapshot.url, Some(&snapshot.title));
            }
        }

        // Opened as given; only address bar input is normalized.
        if let Some(url) = config.startup_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            shell.open_tab(url, None);
        }

        shell.pump_events();
        info!(tabs = shell.tabs.tab_count(), bookmarks = shell.bookmarks.len(), "shell started");
        shell
    }

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn bookmarks(&self) -> &BookmarkManager {
        &self.bookmarks
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn shortcuts(&self) -> &ShortcutManager {
        &self.shortcuts
    }

    pub fn shortcuts_mut(&mut self) -> &mut ShortcutManager {
        &mut self.shortcuts
    }

    pub fn chrome(&self) -> &ChromeState {
        &self.chrome
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn home_url(&self) -> &str {
        &self.session.settings().home_url
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Delivers every queued engine and tab event. Returns the number of
    /// events handled; loops until both queues are empty, since handling an
    /// event may queue more.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let mut progressed = false;
            while let Ok(message) = self.engine_rx.try_recv() {
                self.tabs.dispatch(message);
                handled += 1;
                progressed = true;
            }
            while let Ok((tab_id, event)) = self.tab_rx.try_recv() {
                self.on_tab_event(tab_id, event);
                handled += 1;
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
        handled
    }

    // === Tabs ===

    /// Opens `url` in a new selected tab. An empty `url` opens the blank page.
    pub fn open_tab(&mut self, url: &str, title: Option<&str>) -> TabId {
        let as_blank = url.is_empty() || url == BLANK_PAGE;
        let (id, events) = self.tabs.open(url, as_blank, title);
        self.apply(events);
        id
    }

    pub fn new_tab(&mut self) -> TabId {
        self.open_tab("", None)
    }

    pub fn close_tab(&mut self, tab_id: TabId) {
        let events = self.tabs.close(tab_id);
        self.apply(events);
    }

    pub fn close_selected_tab(&mut self) {
        if let Some(id) = self.tabs.selected().map(|t| t.id()) {
            self.close_tab(id);
        }
    }

    pub fn select_tab(&mut self, index: usize) {
        let events = self.tabs.select(index);
        self.apply(events);
    }

    // === Navigation ===

    /// Navigates the selected tab to address bar input.
    pub fn navigate(&mut self, input: &str) {
        let Some(url) = normalize_address(input) else {
            return;
        };
        let result = match self.tabs.selected_mut() {
            Some(tab) => tab.set_url(&url),
            None => return,
        };
        self.on_tab_result("navigate", result);
    }

    pub fn go_back(&mut self) {
        let result = match self.tabs.selected_mut() {
            Some(tab) if tab.can_go_back() => tab.go_back(),
            _ => return,
        };
        self.on_tab_result("go back", result);
    }

    pub fn go_forward(&mut self) {
        let result = match self.tabs.selected_mut() {
            Some(tab) if tab.can_go_forward() => tab.go_forward(),
            _ => return,
        };
        self.on_tab_result("go forward", result);
    }

    pub fn reload(&mut self) {
        let result = match self.tabs.selected_mut() {
            Some(tab) => tab.reload(),
            None => return,
        };
        self.on_tab_result("reload", result);
    }

    /// Stops the selected tab's current load.
    pub fn stop(&mut self) {
        let result = match self.tabs.selected_mut() {
            Some(tab) => tab.stop(),
            None => return,
        };
        self.on_tab_result("stop", result);
    }

    pub fn go_home(&mut self) {
        let home = self.session.settings().home_url.clone();
        let result = match self.tabs.selected_mut() {
            Some(tab) => tab.set_url(&home),
            None => return,
        };
        self.on_tab_result("go home", result);
    }

    // === Chrome ===

    pub fn toggle_bookmarks_panel(&mut self) {
        self.chrome.bookmarks_panel_visible = !self.chrome.bookmarks_panel_visible;
    }

    /// Makes the selected tab's address the home page and saves at once.
    pub fn set_as_homepage(&mut self) {
        let Some(url) = self.tabs.selected().map(|t| t.url().to_string()) else {
            return;
        };
        self.session.settings_mut().home_url = url.clone();
        match self.session.persist() {
            Ok(()) => {
                info!(url = %url, "home page changed");
                self.notices.push(Notice::Info(format!("Home page set to {}", url)));
            }
            Err(e) => self.report("save settings", e),
        }
    }

    pub fn show_about(&mut self) {
        self.notices.push(Notice::About(AboutInfo::current()));
    }

    pub fn update_geometry(&mut self, geometry: WindowGeometry) {
        self.geometry = geometry;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.tabs.set_viewport(viewport);
    }

    /// Drains the notices queued since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        mem::take(&mut self.notices)
    }

    // === Bookmarks ===

    /// Bookmarks the selected tab under its current title.
    pub fn bookmark_current_page(&mut self) {
        let Some((title, url)) = self
            .tabs
            .selected()
            .map(|t| (t.title().to_string(), t.url().to_string()))
        else {
            return;
        };
        if let Err(e) = self.bookmarks.add(&title, &url) {
            self.report("save bookmarks", e);
        }
    }

    /// Opens a bookmark in the selected tab.
    pub fn open_bookmark(&mut self, index: usize) {
        let Some(url) = self.bookmarks.get(index).map(|b| b.url.clone()) else {
            return;
        };
        let result = match self.tabs.selected_mut() {
            Some(tab) => tab.set_url(&url),
            None => return,
        };
        self.on_tab_result("open bookmark", result);
    }

    pub fn open_bookmark_in_new_tab(&mut self, index: usize) {
        if let Some(url) = self.bookmarks.get(index).map(|b| b.url.clone()) {
            self.open_tab(&url, None);
        }
    }

    pub fn delete_bookmark(&mut self, index: usize) {
        if let Err(e) = self.bookmarks.delete(index) {
            self.report("save bookmarks", e);
        }
    }

    pub fn edit_bookmark(&mut self, index: usize, title: &str, url: &str) {
        if let Err(e) = self.bookmarks.edit(index, title, url) {
            self.report("save bookmarks", e);
        }
    }

    pub fn reorder_bookmark(&mut self, from: usize, to: usize) {
        if let Err(e) = self.bookmarks.reorder(from, to) {
            self.report("save bookmarks", e);
        }
    }

    // === View ===

    pub fn view(&self) -> ShellView {
        let selected = self.tabs.selected().map(|t| t.id());
        let tabs = self
            .tabs
            .tabs()
            .map(|t| TabView {
                id: t.id(),
                title: t.title().to_string(),
                url: t.url().to_string(),
                loading_state: t.loading_state(),
                selected: Some(t.id()) == selected,
            })
            .collect();

        ShellView {
            tabs,
            selected_index: self.tabs.selected_index(),
            chrome: self.chrome.clone(),
            can_go_back: self.tabs.selected().map(|t| t.can_go_back()).unwrap_or(false),
            can_go_forward: self.tabs.selected().map(|t| t.can_go_forward()).unwrap_or(false),
            home_url: self.home_url().to_string(),
            bookmarks: self.bookmarks.list().to_vec(),
            geometry: self.geometry,
        }
    }

    // === Lifecycle ===

    /// Shutdown sequence: save settings, then dispose every tab. Each step
    /// fails on its own without stopping the rest. Calling it again does
    /// nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let snapshots = self.tabs.snapshots();
        let home = self.session.settings().home_url.clone();
        let geometry = self.geometry;
        if let Err(e) = self.session.save(&geometry, &home, &snapshots) {
            self.report("save settings", e);
        }
        self.tabs.shutdown();
        info!(tabs = snapshots.len(), "shell shut down");
    }

    fn apply(&mut self, events: Vec<CollectionEvent>) {
        for event in events {
            match event {
                CollectionEvent::Added { id, .. } => {
                    let tx = self.tab_tx.clone();
                    if let Some(tab) = self.tabs.get_mut(id) {
                        tab.subscribe(move |tab_id, event| {
                            let _ = tx.send((tab_id, event.clone()));
                        });
                    }
                }
                CollectionEvent::Removed { id, index } => {
                    debug!(tab = %id, index, "tab removed from strip");
                }
                CollectionEvent::SelectionChanged { id, closing } => {
                    if let Some(closed) = closing {
                        debug!(tab = %id, closed = %closed, "selection moved off closing tab");
                    }
                    if let Some(tab) = self.tabs.get(id) {
                        self.chrome.address = tab.url().to_string();
                        self.chrome.window_title = tab.title().to_string();
                        self.chrome.status = STATUS_DONE.to_string();
                    }
                }
            }
        }
    }

    fn on_tab_event(&mut self, tab_id: TabId, event: TabEvent) {
        if self.tabs.selected().map(|t| t.id()) != Some(tab_id) {
            return;
        }
        match event {
            TabEvent::NavigationStarting => self.chrome.status = STATUS_LOADING.to_string(),
            TabEvent::NavigationCompleted { success: true } => {
                self.chrome.status = STATUS_DONE.to_string()
            }
            TabEvent::NavigationCompleted { success: false } => {
                self.chrome.status = STATUS_FAILED.to_string()
            }
            TabEvent::TitleChanged(title) => self.chrome.window_title = title,
            TabEvent::UrlChanged(url) => self.chrome.address = url,
        }
    }

    fn on_tab_result(&mut self, action: &str, result: Result<(), TabError>) {
        match result {
            Ok(()) => {}
            Err(TabError::Engine(EngineError::NotReady)) => {
                debug!(action, "engine not ready, ignoring");
            }
            Err(e) => self.report(action, e),
        }
    }

    fn report(&mut self, action: &str, error: impl Display) {
        warn!(action, "{}", error);
        self.notices.push(Notice::Error(error.to_string()));
    }
}
