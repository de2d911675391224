//! TabShell UI layer.
//!
//! Uses `wry` for cross-platform WebView rendering:
//! - Windows: WebView2
//! - Linux: WebKitGTK
//! - macOS: WKWebView
//!
//! The chrome (tab strip, toolbar, bookmarks panel, status bar) is one HTML
//! page filling the window. Every tab renders into its own child web view
//! laid over the chrome's content area. Communication between the Rust
//! backend and the JS chrome uses wry IPC.

pub mod webview_app;
pub mod wry_engine;

use crate::engine::Viewport;

/// Height of the tab strip plus toolbar, in logical pixels.
pub const CHROME_TOP: f64 = 76.0;
/// Height of the status bar.
pub const STATUS_BAR_HEIGHT: f64 = 24.0;
/// Width of the bookmarks panel when shown.
pub const BOOKMARKS_PANEL_WIDTH: f64 = 200.0;

/// Events posted to the UI event loop from web view callbacks.
#[derive(Debug, Clone)]
pub enum UserEvent {
    /// IPC message from the chrome.
    Ipc(String),
    /// Key chord forwarded by a content page.
    Key(String),
    /// A page asked to open a new window.
    OpenTab(String),
}

/// Area left for page content inside a window of the given logical size.
pub fn content_viewport(width: f64, height: f64, bookmarks_panel_visible: bool) -> Viewport {
    let x = if bookmarks_panel_visible { BOOKMARKS_PANEL_WIDTH } else { 0.0 };
    Viewport {
        x,
        y: CHROME_TOP,
        width: (width - x).max(0.0),
        height: (height - CHROME_TOP - STATUS_BAR_HEIGHT).max(0.0),
    }
}
