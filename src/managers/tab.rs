//! A single browser tab and the engine instance it owns.
//!
//! The tab is the only owner of its engine. Engine notifications reach it
//! through [`Tab::handle_engine_event`]; the tab folds them into its own
//! title/url/loading state and republishes them as [`TabEvent`]s. Writes to
//! the tab's url go to the engine in one direction only, guarded by an
//! equality check, so engine feedback never loops back into a navigation.

use tracing::{debug, info, warn};
use url::Url;

use crate::engine::{BrowserEngine, EngineEvent, EngineFactory, EventSink, SubscriptionId, Viewport};
use crate::types::errors::{EngineError, TabError};
use crate::types::session::TabSnapshot;
use crate::types::tab::{
    EngineState, LoadingState, TabEvent, TabId, BLANK_PAGE, FAILED_TITLE, LOADING_TITLE,
    NEW_TAB_TITLE,
};

type Subscriber = Box<dyn FnMut(TabId, &TabEvent)>;

/// A browser tab.
pub struct Tab {
    id: TabId,
    title: String,
    url: String,
    pending_url: Option<String>,
    loading_state: LoadingState,
    engine_state: EngineState,
    engine: Option<Box<dyn BrowserEngine>>,
    subscription: Option<SubscriptionId>,
    subscribers: Vec<Subscriber>,
    disposed: bool,
}

impl Tab {
    /// Creates a tab that will open `url` once its engine is ready.
    ///
    /// The engine itself is not allocated until [`Tab::create_engine`].
    pub fn new(url: &str, title: Option<&str>) -> Self {
        Self {
            id: TabId::new(),
            title: title.unwrap_or(NEW_TAB_TITLE).to_string(),
            url: url.to_string(),
            pending_url: (!url.is_empty()).then(|| url.to_string()),
            loading_state: LoadingState::Idle,
            engine_state: EngineState::Uninitialized,
            engine: None,
            subscription: None,
            subscribers: Vec::new(),
            disposed: false,
        }
    }

    /// Creates a tab on the blank page.
    pub fn blank() -> Self {
        Self::new(BLANK_PAGE, None)
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pending_url(&self) -> Option<&str> {
        self.pending_url.as_deref()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.loading_state
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine_state
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Registers an observer for this tab's events.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(TabId, &TabEvent) + 'static,
    {
        if self.disposed {
            return;
        }
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Allocates the engine, subscribes to its events and starts its
    /// initialization. Returns immediately; calling it again is a no-op.
    pub fn create_engine(
        &mut self,
        factory: &dyn EngineFactory,
        sink: EventSink,
    ) -> Result<(), EngineError> {
        if self.disposed || self.engine.is_some() {
            return Ok(());
        }
        let mut engine = factory.create_engine(self.id)?;
        self.subscription = Some(engine.subscribe(sink));
        self.engine_state = EngineState::Initializing;
        engine.initialize();
        self.engine = Some(engine);
        debug!(tab = %self.id, "engine initializing");
        Ok(())
    }

    /// Requests navigation to `url`.
    ///
    /// Before the engine is ready the address is queued and flushed on
    /// initialization. Once ready, a request for the address the engine
    /// already shows is ignored.
    pub fn set_url(&mut self, url: &str) -> Result<(), TabError> {
        if self.disposed {
            return Err(TabError::Disposed(self.id));
        }
        if url.is_empty() {
            return Err(TabError::InvalidUrl(url.to_string()));
        }

        match self.engine.as_mut() {
            Some(engine) if self.engine_state == EngineState::Ready => {
                if engine.source().as_deref() == Some(url) {
                    return Ok(());
                }
                engine.navigate(url)?;
                self.assign_url(url);
            }
            _ => {
                self.pending_url = Some(url.to_string());
                self.assign_url(url);
            }
        }
        Ok(())
    }

    /// Folds an engine notification into the tab state.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if self.disposed {
            return;
        }
        match event {
            EngineEvent::InitializationCompleted { success } => {
                self.on_initialization_completed(success)
            }
            EngineEvent::NavigationStarting => {
                self.loading_state = LoadingState::Loading;
                self.assign_title(LOADING_TITLE);
                self.notify(TabEvent::NavigationStarting);
            }
            EngineEvent::NavigationCompleted {
                success,
                final_url,
                document_title,
            } => self.on_navigation_completed(success, &final_url, &document_title),
            EngineEvent::DocumentTitleChanged(title) => {
                if !title.is_empty()
                    && self.loading_state != LoadingState::Loading
                    && self.url != BLANK_PAGE
                {
                    self.assign_title(&title);
                }
            }
        }
    }

    fn on_initialization_completed(&mut self, success: bool) {
        if !success {
            warn!(tab = %self.id, "engine initialization failed");
            self.loading_state = LoadingState::Failed;
            return;
        }
        self.engine_state = EngineState::Ready;
        let pending = self.pending_url.take();
        let target = if self.url.is_empty() { pending } else { Some(self.url.clone()) };
        if let (Some(target), Some(engine)) = (target.filter(|u| !u.is_empty()), self.engine.as_mut())
        {
            if let Err(e) = engine.navigate(&target) {
                warn!(tab = %self.id, url = %target, "initial navigation failed: {}", e);
                self.loading_state = LoadingState::Failed;
            }
        }
        info!(tab = %self.id, "engine ready");
    }

    fn on_navigation_completed(&mut self, success: bool, final_url: &str, document_title: &str) {
        if success {
            let title = display_title(final_url, document_title);
            self.assign_title(&title);
            self.assign_url(final_url);
            self.loading_state = LoadingState::Idle;
        } else {
            if self.title == LOADING_TITLE {
                self.assign_title(FAILED_TITLE);
            }
            self.loading_state = LoadingState::Failed;
            debug!(tab = %self.id, url = %final_url, "navigation failed");
        }
        self.notify(TabEvent::NavigationCompleted { success });
    }

    pub fn can_go_back(&self) -> bool {
        self.ready_engine().map(|e| e.can_go_back()).unwrap_or(false)
    }

    pub fn can_go_forward(&self) -> bool {
        self.ready_engine().map(|e| e.can_go_forward()).unwrap_or(false)
    }

    /// Steps back in history. Does nothing when there is no previous page.
    pub fn go_back(&mut self) -> Result<(), TabError> {
        if !self.can_go_back() {
            return Ok(());
        }
        self.ready_engine_mut()?.go_back()?;
        Ok(())
    }

    /// Steps forward in history. Does nothing when there is no next page.
    pub fn go_forward(&mut self) -> Result<(), TabError> {
        if !self.can_go_forward() {
            return Ok(());
        }
        self.ready_engine_mut()?.go_forward()?;
        Ok(())
    }

    pub fn reload(&mut self) -> Result<(), TabError> {
        self.ready_engine_mut()?.reload()?;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), TabError> {
        self.ready_engine_mut()?.stop()?;
        Ok(())
    }

    pub fn set_visible(&mut self, visible: bool) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_visible(visible);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_viewport(viewport);
        }
    }

    /// Engine-free copy of the displayable state.
    pub fn snapshot(&self) -> TabSnapshot {
        TabSnapshot::new(self.title.clone(), self.url.clone())
    }

    /// Releases the engine and drops every subscription. Idempotent.
    ///
    /// Engine failures during teardown are logged and swallowed so bulk
    /// teardown always reaches every tab.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(mut engine) = self.engine.take() {
            if let Some(subscription) = self.subscription.take() {
                engine.unsubscribe(subscription);
            }
            if self.engine_state == EngineState::Ready {
                if let Err(e) = engine.stop() {
                    warn!(tab = %self.id, "failed to stop engine: {}", e);
                }
            }
            if let Err(e) = engine.dispose() {
                warn!(tab = %self.id, "ignoring engine teardown error: {}", e);
            }
        }
        self.subscribers.clear();
        self.pending_url = None;
        debug!(tab = %self.id, "tab disposed");
    }

    fn ready_engine(&self) -> Option<&dyn BrowserEngine> {
        match self.engine_state {
            EngineState::Ready if !self.disposed => self.engine.as_deref(),
            _ => None,
        }
    }

    fn ready_engine_mut(&mut self) -> Result<&mut Box<dyn BrowserEngine>, TabError> {
        if self.disposed {
            return Err(TabError::Disposed(self.id));
        }
        match self.engine.as_mut() {
            Some(engine) if self.engine_state == EngineState::Ready => Ok(engine),
            _ => Err(TabError::Engine(EngineError::NotReady)),
        }
    }

    fn assign_title(&mut self, title: &str) {
        if self.title != title {
            self.title = title.to_string();
            self.notify(TabEvent::TitleChanged(self.title.clone()));
        }
    }

    fn assign_url(&mut self, url: &str) {
        if self.url != url {
            self.url = url.to_string();
            self.notify(TabEvent::UrlChanged(self.url.clone()));
        }
    }

    fn notify(&mut self, event: TabEvent) {
        let id = self.id;
        for subscriber in self.subscribers.iter_mut() {
            subscriber(id, &event);
        }
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("url", &self.url)
            .field("pending_url", &self.pending_url)
            .field("loading_state", &self.loading_state)
            .field("engine_state", &self.engine_state)
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Picks the title shown after a successful load of `final_url`.
pub fn display_title(final_url: &str, document_title: &str) -> String {
    if final_url == BLANK_PAGE {
        return NEW_TAB_TITLE.to_string();
    }
    if !document_title.is_empty() {
        return document_title.to_string();
    }
    Url::parse(final_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| final_url.to_string())
}
