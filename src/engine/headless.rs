//! In-process engine without a rendering surface.
//!
//! Used by the headless binary and by tests. In [`HeadlessMode::Immediate`]
//! every request completes on the spot (events are still delivered through
//! the channel, so ordering matches a real engine). In
//! [`HeadlessMode::Manual`] requests are only recorded and the caller drives
//! initialization and navigation results through a [`HeadlessHandle`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use super::{BrowserEngine, EngineEvent, EngineFactory, EventSink, SubscriptionId, Viewport};
use crate::types::errors::EngineError;
use crate::types::tab::TabId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessMode {
    Immediate,
    Manual,
}

#[derive(Debug)]
struct HeadlessState {
    mode: HeadlessMode,
    sinks: Vec<(SubscriptionId, EventSink)>,
    next_subscription: u64,
    initialization_requested: bool,
    initialized: bool,
    history: Vec<String>,
    cursor: Option<usize>,
    navigations: Vec<String>,
    reloads: usize,
    stops: usize,
    visible: bool,
    viewport: Viewport,
    disposed: bool,
    fail_teardown: bool,
}

impl HeadlessState {
    fn new(mode: HeadlessMode) -> Self {
        Self {
            mode,
            sinks: Vec::new(),
            next_subscription: 0,
            initialization_requested: false,
            initialized: false,
            history: Vec::new(),
            cursor: None,
            navigations: Vec::new(),
            reloads: 0,
            stops: 0,
            visible: false,
            viewport: Viewport::default(),
            disposed: false,
            fail_teardown: false,
        }
    }

    fn broadcast(&self, event: EngineEvent) {
        for (_, sink) in &self.sinks {
            sink.emit(event.clone());
        }
    }

    fn commit(&mut self, url: &str) {
        let keep = self.cursor.map(|c| c + 1).unwrap_or(0);
        self.history.truncate(keep);
        self.history.push(url.to_string());
        self.cursor = Some(self.history.len() - 1);
    }

    fn current(&self) -> Option<String> {
        self.cursor.and_then(|c| self.history.get(c).cloned())
    }

    /// Emits a full successful load of the current history entry.
    fn replay_current(&self) {
        if let Some(url) = self.current() {
            self.broadcast(EngineEvent::NavigationStarting);
            self.broadcast(EngineEvent::NavigationCompleted {
                success: true,
                final_url: url,
                document_title: String::new(),
            });
        }
    }
}

/// Test and inspection handle shared with a [`HeadlessEngine`].
#[derive(Debug, Clone)]
pub struct HeadlessHandle(Rc<RefCell<HeadlessState>>);

impl HeadlessHandle {
    /// Finishes a pending initialization with the given outcome.
    pub fn complete_initialization(&self, success: bool) {
        let mut state = self.0.borrow_mut();
        state.initialized = success;
        state.broadcast(EngineEvent::InitializationCompleted { success });
    }

    /// Reports the start of a navigation to subscribers.
    pub fn start_navigation(&self) {
        self.0.borrow().broadcast(EngineEvent::NavigationStarting);
    }

    /// Finishes a navigation. A successful load becomes the current address.
    pub fn finish_navigation(&self, success: bool, final_url: &str, document_title: &str) {
        let mut state = self.0.borrow_mut();
        if success {
            state.commit(final_url);
        }
        state.broadcast(EngineEvent::NavigationCompleted {
            success,
            final_url: final_url.to_string(),
            document_title: document_title.to_string(),
        });
    }

    /// Emits an arbitrary event to whoever is still subscribed.
    pub fn emit(&self, event: EngineEvent) {
        self.0.borrow().broadcast(event);
    }

    /// Addresses passed to `navigate`, in call order.
    pub fn navigations(&self) -> Vec<String> {
        self.0.borrow().navigations.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().sinks.len()
    }

    pub fn initialization_requested(&self) -> bool {
        self.0.borrow().initialization_requested
    }

    pub fn reload_count(&self) -> usize {
        self.0.borrow().reloads
    }

    pub fn stop_count(&self) -> usize {
        self.0.borrow().stops
    }

    pub fn is_visible(&self) -> bool {
        self.0.borrow().visible
    }

    pub fn viewport(&self) -> Viewport {
        self.0.borrow().viewport
    }

    pub fn is_disposed(&self) -> bool {
        self.0.borrow().disposed
    }

    /// Makes the next `dispose` call report a teardown failure.
    pub fn fail_teardown(&self) {
        self.0.borrow_mut().fail_teardown = true;
    }
}

/// Engine instance backed by a [`HeadlessHandle`].
#[derive(Debug)]
pub struct HeadlessEngine {
    handle: HeadlessHandle,
}

impl HeadlessEngine {
    pub fn new(mode: HeadlessMode) -> Self {
        Self {
            handle: HeadlessHandle(Rc::new(RefCell::new(HeadlessState::new(mode)))),
        }
    }

    pub fn handle(&self) -> HeadlessHandle {
        self.handle.clone()
    }

    fn ready(&self) -> Result<(), EngineError> {
        let state = self.handle.0.borrow();
        if state.initialized && !state.disposed {
            Ok(())
        } else {
            Err(EngineError::NotReady)
        }
    }
}

impl BrowserEngine for HeadlessEngine {
    fn initialize(&mut self) {
        let mut state = self.handle.0.borrow_mut();
        state.initialization_requested = true;
        if state.mode == HeadlessMode::Immediate {
            state.initialized = true;
            state.broadcast(EngineEvent::InitializationCompleted { success: true });
        }
    }

    fn subscribe(&mut self, sink: EventSink) -> SubscriptionId {
        let mut state = self.handle.0.borrow_mut();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.sinks.push((id, sink));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.handle.0.borrow_mut().sinks.retain(|(sub, _)| *sub != id);
    }

    fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        self.ready()?;
        let mut state = self.handle.0.borrow_mut();
        state.navigations.push(url.to_string());
        if state.mode == HeadlessMode::Immediate {
            state.commit(url);
            state.replay_current();
        }
        Ok(())
    }

    fn reload(&mut self) -> Result<(), EngineError> {
        self.ready()?;
        let mut state = self.handle.0.borrow_mut();
        state.reloads += 1;
        if state.mode == HeadlessMode::Immediate {
            state.replay_current();
        }
        Ok(())
    }

    fn go_back(&mut self) -> Result<(), EngineError> {
        self.ready()?;
        if !self.can_go_back() {
            return Err(EngineError::Navigation("no previous page".to_string()));
        }
        let mut state = self.handle.0.borrow_mut();
        state.cursor = state.cursor.map(|c| c - 1);
        if state.mode == HeadlessMode::Immediate {
            state.replay_current();
        }
        Ok(())
    }

    fn go_forward(&mut self) -> Result<(), EngineError> {
        self.ready()?;
        if !self.can_go_forward() {
            return Err(EngineError::Navigation("no next page".to_string()));
        }
        let mut state = self.handle.0.borrow_mut();
        state.cursor = state.cursor.map(|c| c + 1);
        if state.mode == HeadlessMode::Immediate {
            state.replay_current();
        }
        Ok(())
    }

    fn can_go_back(&self) -> bool {
        matches!(self.handle.0.borrow().cursor, Some(c) if c > 0)
    }

    fn can_go_forward(&self) -> bool {
        let state = self.handle.0.borrow();
        matches!(state.cursor, Some(c) if c + 1 < state.history.len())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.handle.0.borrow_mut().stops += 1;
        Ok(())
    }

    fn source(&self) -> Option<String> {
        let state = self.handle.0.borrow();
        if state.initialized {
            state.current()
        } else {
            None
        }
    }

    fn dispose(&mut self) -> Result<(), EngineError> {
        let mut state = self.handle.0.borrow_mut();
        state.disposed = true;
        state.sinks.clear();
        if state.fail_teardown {
            return Err(EngineError::Teardown("headless teardown failure".to_string()));
        }
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        self.handle.0.borrow_mut().visible = visible;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.handle.0.borrow_mut().viewport = viewport;
    }
}

/// Factory handing out [`HeadlessEngine`]s.
///
/// A tracking factory remembers every handle it gave out, disposed or not,
/// so tests can inspect engines after their tab is gone. Clones share the
/// same registry, so a test can keep one clone and give another to the shell.
#[derive(Debug, Clone)]
pub struct HeadlessEngineFactory {
    mode: HeadlessMode,
    tracking: bool,
    engines: Rc<RefCell<Vec<(TabId, HeadlessHandle)>>>,
    created: Rc<Cell<usize>>,
    fail_creation: Rc<Cell<bool>>,
}

impl HeadlessEngineFactory {
    /// Tracking factory, for tests.
    pub fn new(mode: HeadlessMode) -> Self {
        Self {
            mode,
            tracking: true,
            engines: Rc::new(RefCell::new(Vec::new())),
            created: Rc::new(Cell::new(0)),
            fail_creation: Rc::new(Cell::new(false)),
        }
    }

    /// Factory that keeps no handles, for long-running use.
    pub fn untracked(mode: HeadlessMode) -> Self {
        Self {
            tracking: false,
            ..Self::new(mode)
        }
    }

    /// Handle of the engine created for `tab`, if any.
    pub fn handle(&self, tab: TabId) -> Option<HeadlessHandle> {
        self.engines
            .borrow()
            .iter()
            .find(|(id, _)| *id == tab)
            .map(|(_, handle)| handle.clone())
    }

    /// Number of engines created so far.
    pub fn created(&self) -> usize {
        self.created.get()
    }

    /// Number of handles held in the registry.
    pub fn tracked(&self) -> usize {
        self.engines.borrow().len()
    }

    /// Makes subsequent `create_engine` calls fail.
    pub fn set_fail_creation(&self, fail: bool) {
        self.fail_creation.set(fail);
    }
}

impl EngineFactory for HeadlessEngineFactory {
    fn create_engine(&self, tab: TabId) -> Result<Box<dyn BrowserEngine>, EngineError> {
        if self.fail_creation.get() {
            return Err(EngineError::Creation("headless engine creation disabled".to_string()));
        }
        let engine = HeadlessEngine::new(self.mode);
        self.created.set(self.created.get() + 1);
        if self.tracking {
            self.engines.borrow_mut().push((tab, engine.handle()));
        }
        debug!(%tab, mode = ?self.mode, "created headless engine");
        Ok(Box::new(engine))
    }
}
