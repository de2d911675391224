//! `BrowserEngine` backed by a wry child web view.
//!
//! Each tab gets its own web view placed inside the main window at the
//! content viewport. wry callbacks only ever touch the shared sink list and
//! post [`EngineEvent`]s; tab state is updated later on the UI thread.

use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tao::event_loop::EventLoopProxy;
use tao::window::Window;
use tracing::{debug, warn};
use wry::dpi::{LogicalPosition, LogicalSize};
use wry::{NewWindowResponse, PageLoadEvent, Rect, WebView, WebViewBuilder};

use super::UserEvent;
use crate::engine::{BrowserEngine, EngineEvent, EngineFactory, EventSink, SubscriptionId, Viewport};
use crate::types::errors::EngineError;
use crate::types::tab::TabId;

const KEYS_JS: &str = include_str!("../../resources/ui/keys.js");

/// Session history as observed through page loads.
#[derive(Debug, Default)]
struct NavHistory {
    entries: Vec<String>,
    position: usize,
    traversal: Option<usize>,
}

impl NavHistory {
    fn commit(&mut self, url: &str) {
        if let Some(target) = self.traversal.take() {
            if target < self.entries.len() {
                self.position = target;
                self.entries[target] = url.to_string();
                return;
            }
        }
        if self.entries.get(self.position).map(String::as_str) == Some(url) {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.position + 1);
        }
        self.entries.push(url.to_string());
        self.position = self.entries.len() - 1;
    }

    /// A load is starting. A pending traversal only survives if this load is
    /// for its target entry; same-document steps never report a load.
    fn begin(&mut self, url: &str) {
        if let Some(target) = self.traversal {
            if self.entries.get(target).map(String::as_str) != Some(url) {
                self.traversal = None;
            }
        }
    }

    fn can_go_back(&self) -> bool {
        !self.entries.is_empty() && self.position > 0
    }

    fn can_go_forward(&self) -> bool {
        self.position + 1 < self.entries.len()
    }
}

#[derive(Default)]
struct Shared {
    sinks: Vec<(SubscriptionId, EventSink)>,
    last_title: String,
    history: NavHistory,
}

impl Shared {
    fn emit(&self, event: EngineEvent) {
        for (_, sink) in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Extracts `key` from a `{"key": "Ctrl+W"}` message.
pub(crate) fn key_chord(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("key")?.as_str().map(str::to_string)
}

fn to_rect(viewport: Viewport) -> Rect {
    Rect {
        position: LogicalPosition::new(viewport.x, viewport.y).into(),
        size: LogicalSize::new(viewport.width.max(0.0), viewport.height.max(0.0)).into(),
    }
}

/// A tab's web view.
pub struct WryEngine {
    tab: TabId,
    window: Rc<Window>,
    proxy: EventLoopProxy<UserEvent>,
    webview: Option<WebView>,
    shared: Arc<Mutex<Shared>>,
    next_subscription: u64,
    visible: bool,
    viewport: Viewport,
}

impl WryEngine {
    fn new(tab: TabId, window: Rc<Window>, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            tab,
            window,
            proxy,
            webview: None,
            shared: Arc::new(Mutex::new(Shared::default())),
            next_subscription: 1,
            visible: false,
            viewport: Viewport::default(),
        }
    }

    fn build(&self) -> Result<WebView, EngineError> {
        let load_shared = self.shared.clone();
        let title_shared = self.shared.clone();
        let ipc_proxy = self.proxy.clone();
        let window_proxy = self.proxy.clone();

        WebViewBuilder::new()
            .with_bounds(to_rect(self.viewport))
            .with_visible(self.visible)
            .with_initialization_script(KEYS_JS)
            .with_on_page_load_handler(move |event, url| {
                let mut shared = lock(&load_shared);
                match event {
                    PageLoadEvent::Started => {
                        shared.history.begin(&url);
                        shared.last_title.clear();
                        shared.emit(EngineEvent::NavigationStarting);
                    }
                    PageLoadEvent::Finished => {
                        shared.history.commit(&url);
                        let document_title = shared.last_title.clone();
                        shared.emit(EngineEvent::NavigationCompleted {
                            success: true,
                            final_url: url,
                            document_title,
                        });
                    }
                }
            })
            .with_document_title_changed_handler(move |title| {
                let mut shared = lock(&title_shared);
                shared.last_title = title.clone();
                shared.emit(EngineEvent::DocumentTitleChanged(title));
            })
            .with_ipc_handler(move |request: wry::http::Request<String>| {
                // Pages may only forward key chords.
                if let Some(keys) = key_chord(request.body()) {
                    let _ = ipc_proxy.send_event(UserEvent::Key(keys));
                }
            })
            .with_new_window_req_handler(move |url, _features| {
                if url.starts_with("http://") || url.starts_with("https://") {
                    let _ = window_proxy.send_event(UserEvent::OpenTab(url));
                }
                NewWindowResponse::Deny
            })
            .with_devtools(cfg!(debug_assertions))
            .build_as_child(&*self.window)
            .map_err(|e| EngineError::Creation(e.to_string()))
    }

    fn webview(&self) -> Result<&WebView, EngineError> {
        self.webview.as_ref().ok_or(EngineError::NotReady)
    }
}

impl BrowserEngine for WryEngine {
    fn initialize(&mut self) {
        let result = self.build();
        let success = result.is_ok();
        match result {
            Ok(webview) => self.webview = Some(webview),
            Err(e) => warn!(tab = %self.tab, "web view creation failed: {}", e),
        }
        lock(&self.shared).emit(EngineEvent::InitializationCompleted { success });
    }

    fn subscribe(&mut self, sink: EventSink) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        lock(&self.shared).sinks.push((id, sink));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        lock(&self.shared).sinks.retain(|(sub, _)| *sub != id);
    }

    fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        self.webview()?
            .load_url(url)
            .map_err(|e| EngineError::Navigation(e.to_string()))
    }

    fn reload(&mut self) -> Result<(), EngineError> {
        self.webview()?
            .reload()
            .map_err(|e| EngineError::Navigation(e.to_string()))
    }

    fn go_back(&mut self) -> Result<(), EngineError> {
        let webview = self.webview.as_ref().ok_or(EngineError::NotReady)?;
        {
            let mut shared = lock(&self.shared);
            if !shared.history.can_go_back() {
                return Ok(());
            }
            shared.history.traversal = Some(shared.history.position - 1);
        }
        webview
            .evaluate_script("history.back()")
            .map_err(|e| EngineError::Navigation(e.to_string()))
    }

    fn go_forward(&mut self) -> Result<(), EngineError> {
        let webview = self.webview.as_ref().ok_or(EngineError::NotReady)?;
        {
            let mut shared = lock(&self.shared);
            if !shared.history.can_go_forward() {
                return Ok(());
            }
            shared.history.traversal = Some(shared.history.position + 1);
        }
        webview
            .evaluate_script("history.forward()")
            .map_err(|e| EngineError::Navigation(e.to_string()))
    }

    fn can_go_back(&self) -> bool {
        lock(&self.shared).history.can_go_back()
    }

    fn can_go_forward(&self) -> bool {
        lock(&self.shared).history.can_go_forward()
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.webview()?
            .evaluate_script("window.stop()")
            .map_err(|e| EngineError::Navigation(e.to_string()))
    }

    fn source(&self) -> Option<String> {
        self.webview.as_ref().and_then(|w| w.url().ok())
    }

    fn dispose(&mut self) -> Result<(), EngineError> {
        lock(&self.shared).sinks.clear();
        if let Some(webview) = self.webview.take() {
            let hidden = webview.set_visible(false);
            drop(webview);
            hidden.map_err(|e| EngineError::Teardown(e.to_string()))?;
        }
        debug!(tab = %self.tab, "web view released");
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if let Some(webview) = self.webview.as_ref() {
            if let Err(e) = webview.set_visible(visible) {
                warn!(tab = %self.tab, "failed to change visibility: {}", e);
            }
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(webview) = self.webview.as_ref() {
            if let Err(e) = webview.set_bounds(to_rect(viewport)) {
                warn!(tab = %self.tab, "failed to resize web view: {}", e);
            }
        }
    }
}

/// Creates one [`WryEngine`] per tab, all children of the main window.
pub struct WryEngineFactory {
    window: Rc<Window>,
    proxy: EventLoopProxy<UserEvent>,
}

impl WryEngineFactory {
    pub fn new(window: Rc<Window>, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self { window, proxy }
    }
}

impl EngineFactory for WryEngineFactory {
    fn create_engine(&self, tab: TabId) -> Result<Box<dyn BrowserEngine>, EngineError> {
        Ok(Box::new(WryEngine::new(tab, self.window.clone(), self.proxy.clone())))
    }
}
