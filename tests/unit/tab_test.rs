use std::cell::RefCell;
use std::rc::Rc;

use rstest::rstest;
use tabshell::engine::headless::{HeadlessEngineFactory, HeadlessHandle, HeadlessMode};
use tabshell::engine::{event_channel, EngineEvent, EngineMessage, EventSink};
use tabshell::managers::tab::{display_title, Tab};
use tabshell::types::errors::{EngineError, TabError};
use tabshell::types::tab::{EngineState, LoadingState, TabEvent};
use tokio::sync::mpsc::UnboundedReceiver;

struct Fixture {
    tab: Tab,
    engine: HeadlessHandle,
    rx: UnboundedReceiver<EngineMessage>,
    events: Rc<RefCell<Vec<TabEvent>>>,
}

impl Fixture {
    fn new(url: &str) -> Self {
        let factory = HeadlessEngineFactory::new(HeadlessMode::Manual);
        let (tx, rx) = event_channel();
        let mut tab = Tab::new(url, None);
        let events = Rc::new(RefCell::new(Vec::new()));
        let recorded = events.clone();
        tab.subscribe(move |_, event| recorded.borrow_mut().push(event.clone()));
        tab.create_engine(&factory, EventSink::new(tab.id(), tx)).unwrap();
        let engine = factory.handle(tab.id()).unwrap();
        Self { tab, engine, rx, events }
    }

    fn ready(url: &str) -> Self {
        let mut fixture = Self::new(url);
        fixture.engine.complete_initialization(true);
        fixture.drain();
        fixture.events.borrow_mut().clear();
        fixture
    }

    /// Delivers queued engine messages to the tab.
    fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(message) = self.rx.try_recv() {
            assert_eq!(message.tab, self.tab.id());
            self.tab.handle_engine_event(message.event);
            count += 1;
        }
        count
    }

    fn events(&self) -> Vec<TabEvent> {
        self.events.borrow().clone()
    }
}

// === Initialization ===

#[test]
fn test_create_engine_starts_initialization() {
    let f = Fixture::new("https://a.test/");
    assert_eq!(f.tab.engine_state(), EngineState::Initializing);
    assert!(f.engine.initialization_requested());
    assert_eq!(f.engine.subscriber_count(), 1);
    assert!(f.engine.navigations().is_empty());
}

#[test]
fn test_create_engine_twice_is_noop() {
    let factory = HeadlessEngineFactory::new(HeadlessMode::Manual);
    let (tx, _rx) = event_channel();
    let mut tab = Tab::blank();
    tab.create_engine(&factory, EventSink::new(tab.id(), tx.clone())).unwrap();
    tab.create_engine(&factory, EventSink::new(tab.id(), tx)).unwrap();
    assert_eq!(factory.created(), 1);
}

#[test]
fn test_engine_creation_failure_leaves_tab_uninitialized() {
    let factory = HeadlessEngineFactory::new(HeadlessMode::Manual);
    factory.set_fail_creation(true);
    let (tx, _rx) = event_channel();
    let mut tab = Tab::blank();
    let result = tab.create_engine(&factory, EventSink::new(tab.id(), tx));
    assert!(matches!(result, Err(EngineError::Creation(_))));
    assert_eq!(tab.engine_state(), EngineState::Uninitialized);
    assert!(!tab.has_engine());
}

#[test]
fn test_initialization_flushes_queued_url() {
    let mut f = Fixture::new("https://a.test/");
    f.engine.complete_initialization(true);
    f.drain();
    assert_eq!(f.tab.engine_state(), EngineState::Ready);
    assert_eq!(f.engine.navigations(), vec!["https://a.test/"]);
    assert_eq!(f.tab.pending_url(), None);
}

#[test]
fn test_latest_address_wins_before_ready() {
    let mut f = Fixture::new("https://a.test/");
    f.tab.set_url("https://b.test/").unwrap();
    assert_eq!(f.tab.url(), "https://b.test/");
    assert_eq!(f.tab.pending_url(), Some("https://b.test/"));
    assert!(f.engine.navigations().is_empty());

    f.engine.complete_initialization(true);
    f.drain();
    assert_eq!(f.engine.navigations(), vec!["https://b.test/"]);
}

#[test]
fn test_initialization_failure_keeps_pending_url() {
    let mut f = Fixture::new("https://a.test/");
    f.engine.complete_initialization(false);
    f.drain();
    assert_eq!(f.tab.engine_state(), EngineState::Initializing);
    assert_eq!(f.tab.loading_state(), LoadingState::Failed);
    assert_eq!(f.tab.pending_url(), Some("https://a.test/"));
    assert!(f.engine.navigations().is_empty());
}

// === Navigation ===

#[test]
fn test_set_url_when_ready_navigates() {
    let mut f = Fixture::ready("https://a.test/");
    f.tab.set_url("https://b.test/").unwrap();
    assert_eq!(f.engine.navigations(), vec!["https://a.test/", "https://b.test/"]);
    assert_eq!(f.tab.url(), "https://b.test/");
    assert_eq!(f.events(), vec![TabEvent::UrlChanged("https://b.test/".to_string())]);
}

#[test]
fn test_set_url_to_current_source_is_noop() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.finish_navigation(true, "https://a.test/", "A");
    f.drain();
    f.tab.set_url("https://a.test/").unwrap();
    assert_eq!(f.engine.navigations().len(), 1);
}

#[test]
fn test_set_url_rejects_empty_address() {
    let mut f = Fixture::ready("https://a.test/");
    assert!(matches!(f.tab.set_url(""), Err(TabError::InvalidUrl(_))));
    assert_eq!(f.tab.url(), "https://a.test/");
}

#[test]
fn test_navigation_starting_marks_loading() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.start_navigation();
    f.drain();
    assert_eq!(f.tab.loading_state(), LoadingState::Loading);
    assert_eq!(f.tab.title(), "Loading…");
    assert_eq!(
        f.events(),
        vec![
            TabEvent::TitleChanged("Loading…".to_string()),
            TabEvent::NavigationStarting,
        ]
    );
}

#[test]
fn test_navigation_completed_applies_title_and_url() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.start_navigation();
    f.engine.finish_navigation(true, "https://a.test/home", "Home");
    f.drain();
    assert_eq!(f.tab.loading_state(), LoadingState::Idle);
    assert_eq!(f.tab.title(), "Home");
    assert_eq!(f.tab.url(), "https://a.test/home");
    assert_eq!(
        f.events().last(),
        Some(&TabEvent::NavigationCompleted { success: true })
    );
}

#[test]
fn test_navigation_failure_while_loading() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.start_navigation();
    f.engine.finish_navigation(false, "https://a.test/", "");
    f.drain();
    assert_eq!(f.tab.loading_state(), LoadingState::Failed);
    assert_eq!(f.tab.title(), "Failed to load");
    assert_eq!(
        f.events().last(),
        Some(&TabEvent::NavigationCompleted { success: false })
    );
}

#[test]
fn test_navigation_failure_keeps_real_title() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.finish_navigation(true, "https://a.test/", "A page");
    f.engine.finish_navigation(false, "https://a.test/", "");
    f.drain();
    assert_eq!(f.tab.title(), "A page");
    assert_eq!(f.tab.loading_state(), LoadingState::Failed);
}

#[test]
fn test_document_title_applies_when_idle() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.finish_navigation(true, "https://a.test/", "");
    f.engine.emit(EngineEvent::DocumentTitleChanged("Late title".to_string()));
    f.drain();
    assert_eq!(f.tab.title(), "Late title");
}

#[test]
fn test_document_title_ignored_while_loading() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.start_navigation();
    f.engine.emit(EngineEvent::DocumentTitleChanged("Too early".to_string()));
    f.drain();
    assert_eq!(f.tab.title(), "Loading…");
}

#[test]
fn test_document_title_ignored_on_blank_page() {
    let mut f = Fixture::ready("about:blank");
    f.engine.finish_navigation(true, "about:blank", "");
    f.engine.emit(EngineEvent::DocumentTitleChanged("Blank".to_string()));
    f.drain();
    assert_eq!(f.tab.title(), "new tab");
}

#[test]
fn test_document_title_ignores_empty() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.finish_navigation(true, "https://a.test/", "Kept");
    f.engine.emit(EngineEvent::DocumentTitleChanged(String::new()));
    f.drain();
    assert_eq!(f.tab.title(), "Kept");
}

#[rstest]
#[case("about:blank", "Ignored", "new tab")]
#[case("about:blank", "", "new tab")]
#[case("https://example.com/", "Example Domain", "Example Domain")]
#[case("https://example.com/path", "", "example.com")]
#[case("file:///tmp/page.html", "", "file:///tmp/page.html")]
fn test_display_title(#[case] final_url: &str, #[case] document_title: &str, #[case] expected: &str) {
    assert_eq!(display_title(final_url, document_title), expected);
}

// === History and control ===

#[test]
fn test_history_commands_are_noops_without_history() {
    let mut f = Fixture::ready("https://a.test/");
    assert!(!f.tab.can_go_back());
    assert!(!f.tab.can_go_forward());
    assert!(f.tab.go_back().is_ok());
    assert!(f.tab.go_forward().is_ok());
}

#[test]
fn test_history_follows_engine() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.finish_navigation(true, "https://a.test/", "");
    f.tab.set_url("https://b.test/").unwrap();
    f.engine.finish_navigation(true, "https://b.test/", "");
    f.drain();
    assert!(f.tab.can_go_back());
    f.tab.go_back().unwrap();
    assert!(f.tab.can_go_forward());
}

#[test]
fn test_reload_requires_ready_engine() {
    let mut f = Fixture::new("https://a.test/");
    assert!(matches!(f.tab.reload(), Err(TabError::Engine(EngineError::NotReady))));
    f.engine.complete_initialization(true);
    f.drain();
    f.tab.reload().unwrap();
    assert_eq!(f.engine.reload_count(), 1);
}

// === Disposal ===

#[test]
fn test_dispose_before_initialization_receives_nothing() {
    let mut f = Fixture::new("https://a.test/");
    f.tab.dispose();
    assert!(f.engine.is_disposed());
    assert_eq!(f.engine.subscriber_count(), 0);
    assert_eq!(f.tab.subscriber_count(), 0);

    f.engine.complete_initialization(true);
    f.engine.finish_navigation(true, "https://a.test/", "Late");
    assert_eq!(f.drain(), 0);
    assert!(f.events().is_empty());
    assert!(f.engine.navigations().is_empty());
}

#[test]
fn test_late_events_after_dispose_are_ignored() {
    let mut f = Fixture::ready("https://a.test/");
    f.tab.dispose();
    f.tab.handle_engine_event(EngineEvent::NavigationStarting);
    assert!(f.events().is_empty());
    assert_eq!(f.tab.loading_state(), LoadingState::Idle);
}

#[test]
fn test_dispose_is_idempotent() {
    let mut f = Fixture::ready("https://a.test/");
    f.tab.dispose();
    f.tab.dispose();
    assert!(f.tab.is_disposed());
    assert!(!f.tab.has_engine());
    assert_eq!(f.engine.stop_count(), 1);
}

#[test]
fn test_dispose_skips_stop_when_not_ready() {
    let mut f = Fixture::new("https://a.test/");
    f.tab.dispose();
    assert_eq!(f.engine.stop_count(), 0);
}

#[test]
fn test_dispose_swallows_teardown_failure() {
    let mut f = Fixture::ready("https://a.test/");
    f.engine.fail_teardown();
    f.tab.dispose();
    assert!(f.tab.is_disposed());
    assert!(f.engine.is_disposed());
}

#[test]
fn test_set_url_after_dispose_fails() {
    let mut f = Fixture::ready("https://a.test/");
    f.tab.dispose();
    assert!(matches!(f.tab.set_url("https://b.test/"), Err(TabError::Disposed(_))));
}

#[test]
fn test_drop_releases_engine() {
    let f = Fixture::ready("https://a.test/");
    let engine = f.engine.clone();
    drop(f);
    assert!(engine.is_disposed());
}

#[test]
fn test_snapshot_copies_title_and_url() {
    let f = Fixture::new("https://a.test/");
    let snapshot = f.tab.snapshot();
    assert_eq!(snapshot.title, "new tab");
    assert_eq!(snapshot.url, "https://a.test/");
}
