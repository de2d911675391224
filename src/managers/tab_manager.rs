//! Ordered tab collection with a selected tab.
//!
//! The collection always holds at least one tab once seeded: closing the last
//! tab opens a fresh blank one. Engines are created lazily, the first time a
//! tab becomes selected. Every mutation reports what happened as a list of
//! [`CollectionEvent`]s so the shell can react without observing the
//! collection mid-change.

use std::rc::Rc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::engine::{EngineFactory, EngineMessage, EventSink, Viewport};
use crate::managers::tab::Tab;
use crate::types::session::TabSnapshot;
use crate::types::tab::{TabId, BLANK_PAGE};

/// Structural change to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    Added { id: TabId, index: usize },
    Removed { id: TabId, index: usize },
    /// `closing` names the tab whose close caused this change, if any.
    SelectionChanged { id: TabId, closing: Option<TabId> },
}

/// Trait defining the tab collection interface.
pub trait TabManagerTrait {
    fn open(&mut self, url: &str, as_blank: bool, title: Option<&str>) -> (TabId, Vec<CollectionEvent>);
    fn close(&mut self, tab_id: TabId) -> Vec<CollectionEvent>;
    fn select(&mut self, index: usize) -> Vec<CollectionEvent>;
    fn get(&self, tab_id: TabId) -> Option<&Tab>;
    fn get_mut(&mut self, tab_id: TabId) -> Option<&mut Tab>;
    fn selected(&self) -> Option<&Tab>;
    fn selected_mut(&mut self) -> Option<&mut Tab>;
    fn selected_index(&self) -> Option<usize>;
    fn index_of(&self, tab_id: TabId) -> Option<usize>;
    fn tab_count(&self) -> usize;
    fn tab_ids(&self) -> Vec<TabId>;
    fn snapshots(&self) -> Vec<TabSnapshot>;
    fn dispatch(&mut self, message: EngineMessage) -> bool;
}

/// Tab collection backed by a `Vec` in display order.
pub struct TabManager {
    tabs: Vec<Tab>,
    selected: Option<TabId>,
    factory: Rc<dyn EngineFactory>,
    events: UnboundedSender<EngineMessage>,
    viewport: Viewport,
}

impl TabManager {
    /// Creates an empty collection. Engines for its tabs come from `factory`
    /// and post their events into `events`.
    pub fn new(factory: Rc<dyn EngineFactory>, events: UnboundedSender<EngineMessage>) -> Self {
        Self {
            tabs: Vec::new(),
            selected: None,
            factory,
            events,
            viewport: Viewport::default(),
        }
    }

    pub fn tabs(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Resizes every engine surface.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        for tab in self.tabs.iter_mut() {
            tab.set_viewport(viewport);
        }
    }

    /// Disposes every tab without re-seeding. Used on shutdown only.
    pub fn shutdown(&mut self) {
        let count = self.tabs.len();
        for mut tab in self.tabs.drain(..) {
            tab.dispose();
        }
        self.selected = None;
        info!(count, "disposed all tabs");
    }

    /// Makes `tab_id` the selected tab, creating its engine on first use.
    fn select_id(&mut self, tab_id: TabId, closing: Option<TabId>) -> Option<CollectionEvent> {
        if self.selected == Some(tab_id) {
            return None;
        }
        let index = self.index_of(tab_id)?;

        if let Some(previous) = self.selected.and_then(|id| self.index_of(id)) {
            self.tabs[previous].set_visible(false);
        }

        let sink = EventSink::new(tab_id, self.events.clone());
        let viewport = self.viewport;
        let tab = &mut self.tabs[index];
        if let Err(e) = tab.create_engine(self.factory.as_ref(), sink) {
            warn!(tab = %tab_id, "could not create engine: {}", e);
        }
        tab.set_viewport(viewport);
        tab.set_visible(true);

        self.selected = Some(tab_id);
        Some(CollectionEvent::SelectionChanged {
            id: tab_id,
            closing,
        })
    }
}

impl TabManagerTrait for TabManager {
    /// Appends a tab and selects it. `as_blank` ignores `url` and opens the
    /// blank page.
    fn open(&mut self, url: &str, as_blank: bool, title: Option<&str>) -> (TabId, Vec<CollectionEvent>) {
        let url = if as_blank { BLANK_PAGE } else { url };
        let tab = Tab::new(url, title);
        let id = tab.id();
        self.tabs.push(tab);
        let index = self.tabs.len() - 1;
        debug!(tab = %id, index, url, "opened tab");

        let mut events = vec![CollectionEvent::Added { id, index }];
        events.extend(self.select_id(id, None));
        (id, events)
    }

    /// Closes a tab: moves the selection off it first, removes it, then
    /// disposes it. Closing an absent tab does nothing.
    fn close(&mut self, tab_id: TabId) -> Vec<CollectionEvent> {
        let Some(index) = self.index_of(tab_id) else {
            debug!(tab = %tab_id, "close ignored, tab not present");
            return Vec::new();
        };

        let mut events = Vec::new();
        if self.tabs.len() > 1 && self.selected == Some(tab_id) {
            let next = if index == self.tabs.len() - 1 { index - 1 } else { index + 1 };
            let next_id = self.tabs[next].id();
            events.extend(self.select_id(next_id, Some(tab_id)));
        }

        let mut tab = self.tabs.remove(index);
        if self.selected == Some(tab_id) {
            self.selected = None;
        }
        events.push(CollectionEvent::Removed { id: tab_id, index });
        tab.dispose();
        debug!(tab = %tab_id, index, "closed tab");

        if self.tabs.is_empty() {
            let (_, opened) = self.open(BLANK_PAGE, true, None);
            events.extend(opened);
        }
        events
    }

    fn select(&mut self, index: usize) -> Vec<CollectionEvent> {
        let Some(id) = self.tabs.get(index).map(Tab::id) else {
            return Vec::new();
        };
        self.select_id(id, None).into_iter().collect()
    }

    fn get(&self, tab_id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id() == tab_id)
    }

    fn get_mut(&mut self, tab_id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id() == tab_id)
    }

    fn selected(&self) -> Option<&Tab> {
        self.selected.and_then(|id| self.get(id))
    }

    fn selected_mut(&mut self) -> Option<&mut Tab> {
        let id = self.selected?;
        self.get_mut(id)
    }

    fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.index_of(id))
    }

    fn index_of(&self, tab_id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id() == tab_id)
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(Tab::id).collect()
    }

    fn snapshots(&self) -> Vec<TabSnapshot> {
        self.tabs.iter().map(Tab::snapshot).collect()
    }

    /// Routes an engine message to its tab. Messages for tabs that are no
    /// longer in the collection are dropped.
    fn dispatch(&mut self, message: EngineMessage) -> bool {
        match self.get_mut(message.tab) {
            Some(tab) => {
                tab.handle_engine_event(message.event);
                true
            }
            None => {
                debug!(tab = %message.tab, "dropping event for closed tab");
                false
            }
        }
    }
}
