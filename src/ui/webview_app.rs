//! WebView-based browser application using `wry` + `tao`.
//!
//! Architecture:
//! - One chrome web view fills the window and renders the tab strip,
//!   toolbar, bookmarks panel and status bar from `resources/ui/chrome.html`.
//! - Every tab owns a child web view ([`WryEngine`](super::wry_engine::WryEngine))
//!   laid over the chrome's content area.
//! - IPC from JS to Rust goes through `window.ipc.postMessage()` and the
//!   event loop proxy; the shell is only touched on the event loop thread.
//! - The loop wakes periodically to drain engine events and push the view
//!   model to the chrome when it changed.

use std::error::Error;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tao::dpi::{LogicalPosition, LogicalSize};
use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use tao::window::{Window, WindowBuilder};
use tracing::{debug, info, warn};
use wry::{WebView, WebViewBuilder};

use super::wry_engine::WryEngineFactory;
use super::{content_viewport, UserEvent};
use crate::action_handler::{handle_ipc_message, handle_key};
use crate::app::{ShellController, PRODUCT_NAME};
use crate::cli::CliOptions;
use crate::types::settings::{WindowGeometry, WindowState, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

const CHROME_HTML: &str = include_str!("../../resources/ui/chrome.html");
const KEYS_JS: &str = include_str!("../../resources/ui/keys.js");

const PUMP_INTERVAL: Duration = Duration::from_millis(30);

/// UI-side bookkeeping kept alongside the shell.
#[derive(Default)]
struct UiState {
    /// The chrome page has loaded and can receive updates.
    ready: bool,
    last_view: String,
    panel_visible: Option<bool>,
}

fn build_chrome(window: &Window, proxy: EventLoopProxy<UserEvent>) -> Result<WebView, Box<dyn Error>> {
    let builder = WebViewBuilder::new()
        .with_html(CHROME_HTML)
        .with_initialization_script(KEYS_JS)
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            let _ = proxy.send_event(UserEvent::Ipc(msg.body().clone()));
        })
        .with_devtools(cfg!(debug_assertions));

    #[cfg(target_os = "linux")]
    let webview = {
        use tao::platform::unix::WindowExtUnix;
        use wry::WebViewBuilderExtUnix;
        let vbox = window.default_vbox().ok_or("window has no GTK container")?;
        builder.build_gtk(vbox)?
    };

    #[cfg(not(target_os = "linux"))]
    let webview = builder.build(window)?;

    Ok(webview)
}

fn apply_geometry(window: &Window, geometry: WindowGeometry) {
    window.set_inner_size(LogicalSize::new(geometry.width, geometry.height));
    window.set_outer_position(LogicalPosition::new(geometry.left, geometry.top));
    if geometry.state == WindowState::Maximized {
        window.set_maximized(true);
    }
}

/// Copies the window placement into the shell. Size and position are only
/// taken while the window is in its normal state so a maximized window
/// still restores to its last normal bounds.
fn record_geometry(window: &Window, shell: &mut ShellController) {
    let scale = window.scale_factor();
    let state = if window.is_minimized() {
        WindowState::Minimized
    } else if window.is_maximized() {
        WindowState::Maximized
    } else {
        WindowState::Normal
    };

    let mut geometry = shell.geometry();
    geometry.state = state;
    if state == WindowState::Normal {
        let size = window.inner_size().to_logical::<f64>(scale);
        geometry.width = size.width;
        geometry.height = size.height;
        if let Ok(position) = window.outer_position() {
            let position = position.to_logical::<f64>(scale);
            geometry.left = position.x;
            geometry.top = position.y;
        }
    }
    shell.update_geometry(geometry);
}

fn sync_viewport(window: &Window, shell: &mut ShellController) {
    let size = window.inner_size().to_logical::<f64>(window.scale_factor());
    let panel = shell.chrome().bookmarks_panel_visible;
    shell.set_viewport(content_viewport(size.width, size.height, panel));
}

fn on_ipc(shell: &mut ShellController, ui: &mut UiState, body: &str) {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("malformed IPC message: {}", e);
            return;
        }
    };

    if value.get("ready").is_some() {
        ui.ready = true;
        ui.last_view.clear();
        return;
    }
    if let Some(keys) = value.get("key").and_then(serde_json::Value::as_str) {
        if !handle_key(shell, keys) {
            debug!(keys, "unbound key chord");
        }
        return;
    }
    if let Err(e) = handle_ipc_message(shell, body) {
        warn!("{}", e);
    }
}

fn render(chrome: &WebView, window: &Window, shell: &mut ShellController, ui: &mut UiState) {
    let view = shell.view();
    if window.title() != view.chrome.window_title {
        window.set_title(&view.chrome.window_title);
    }

    if ui.panel_visible != Some(view.chrome.bookmarks_panel_visible) {
        ui.panel_visible = Some(view.chrome.bookmarks_panel_visible);
        sync_viewport(window, shell);
    }

    if !ui.ready {
        return;
    }

    let notices = shell.take_notices();
    if !notices.is_empty() {
        match serde_json::to_string(&notices) {
            Ok(json) => eval(chrome, &format!("window.tabshell && window.tabshell.notify({})", json)),
            Err(e) => warn!("failed to serialize notices: {}", e),
        }
    }

    match serde_json::to_string(&view) {
        Ok(json) if json != ui.last_view => {
            eval(chrome, &format!("window.tabshell && window.tabshell.render({})", json));
            ui.last_view = json;
        }
        Ok(_) => {}
        Err(e) => warn!("failed to serialize view: {}", e),
    }
}

fn eval(chrome: &WebView, script: &str) {
    if let Err(e) = chrome.evaluate_script(script) {
        warn!("chrome script failed: {}", e);
    }
}

// ─── Main entry point ───

pub fn run(opts: CliOptions) -> Result<(), Box<dyn Error>> {
    let event_loop: EventLoop<UserEvent> = EventLoopBuilder::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = Rc::new(
        WindowBuilder::new()
            .with_title(PRODUCT_NAME)
            .with_inner_size(LogicalSize::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT))
            .build(&event_loop)?,
    );

    let chrome = build_chrome(&window, proxy.clone())?;
    let factory = Rc::new(WryEngineFactory::new(window.clone(), proxy));
    let mut shell = ShellController::boot(opts.shell_config(), factory);
    apply_geometry(&window, shell.geometry());
    sync_viewport(&window, &mut shell);
    info!("window ready");

    let mut ui = UiState::default();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + PUMP_INTERVAL);

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                record_geometry(&window, &mut shell);
                shell.shutdown();
                *control_flow = ControlFlow::Exit;
                return;
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => {
                record_geometry(&window, &mut shell);
                sync_viewport(&window, &mut shell);
            }
            Event::WindowEvent {
                event: WindowEvent::Moved(_),
                ..
            } => record_geometry(&window, &mut shell),
            Event::UserEvent(UserEvent::Ipc(body)) => on_ipc(&mut shell, &mut ui, &body),
            Event::UserEvent(UserEvent::Key(keys)) => {
                handle_key(&mut shell, &keys);
            }
            Event::UserEvent(UserEvent::OpenTab(url)) => {
                shell.open_tab(&url, None);
            }
            _ => {}
        }

        if shell.is_shut_down() {
            return;
        }
        shell.pump_events();
        render(&chrome, &window, &mut shell, &mut ui);
    });
}
