//! Embedded browser engine contract.
//!
//! An engine is an opaque rendering surface owned by exactly one tab. Engines
//! never call back into shell state directly: every notification is posted as
//! an [`EngineMessage`] through an [`EventSink`], and the shell drains the
//! channel on the UI thread. A sink may be cloned into engine callbacks that
//! run on other threads; delivery is always re-marshaled by the channel.

pub mod headless;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::types::errors::EngineError;
use crate::types::tab::TabId;

/// Notifications emitted by an engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    InitializationCompleted {
        success: bool,
    },
    NavigationStarting,
    NavigationCompleted {
        success: bool,
        final_url: String,
        document_title: String,
    },
    DocumentTitleChanged(String),
}

/// An engine event tagged with the tab that owns the emitting engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMessage {
    pub tab: TabId,
    pub event: EngineEvent,
}

/// Creates the channel engines post their events into.
pub fn event_channel() -> (UnboundedSender<EngineMessage>, UnboundedReceiver<EngineMessage>) {
    mpsc::unbounded_channel()
}

/// Write end of the engine event channel, bound to one tab.
#[derive(Debug, Clone)]
pub struct EventSink {
    tab: TabId,
    tx: UnboundedSender<EngineMessage>,
}

impl EventSink {
    pub fn new(tab: TabId, tx: UnboundedSender<EngineMessage>) -> Self {
        Self { tab, tx }
    }

    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Posts an event. Returns false once the shell side has hung up.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.tx
            .send(EngineMessage {
                tab: self.tab,
                event,
            })
            .is_ok()
    }
}

/// Handle returned by [`BrowserEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Area of the window a content surface occupies, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Capabilities a tab needs from its engine.
///
/// Initialization is asynchronous: `initialize` returns at once and the
/// outcome arrives later as [`EngineEvent::InitializationCompleted`].
pub trait BrowserEngine {
    fn initialize(&mut self);
    fn subscribe(&mut self, sink: EventSink) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
    fn navigate(&mut self, url: &str) -> Result<(), EngineError>;
    fn reload(&mut self) -> Result<(), EngineError>;
    fn go_back(&mut self) -> Result<(), EngineError>;
    fn go_forward(&mut self) -> Result<(), EngineError>;
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn stop(&mut self) -> Result<(), EngineError>;
    /// Address currently shown by the engine, if it has one.
    fn source(&self) -> Option<String>;
    fn dispose(&mut self) -> Result<(), EngineError>;

    fn set_visible(&mut self, _visible: bool) {}

    fn set_viewport(&mut self, _viewport: Viewport) {}
}

/// Allocates engine instances for tabs.
pub trait EngineFactory {
    fn create_engine(&self, tab: TabId) -> Result<Box<dyn BrowserEngine>, EngineError>;
}
