//! Tests for the shell controller driven through headless engines.

use std::fs;
use std::rc::Rc;

use rstest::rstest;
use tabshell::app::{
    Notice, ShellConfig, ShellController, STATUS_DONE, STATUS_FAILED, STATUS_LOADING,
};
use tabshell::engine::headless::{HeadlessEngineFactory, HeadlessHandle, HeadlessMode};
use tabshell::managers::bookmark_manager::{BookmarkManagerTrait, BOOKMARKS_FILE};
use tabshell::managers::session_manager::{SessionManagerTrait, SETTINGS_FILE};
use tabshell::managers::tab_manager::TabManagerTrait;
use tabshell::types::settings::{Settings, WindowGeometry, WindowState, DEFAULT_HOME_URL};
use tabshell::types::tab::{BLANK_PAGE, NEW_TAB_TITLE};
use tempfile::TempDir;

fn boot(dir: &TempDir, mode: HeadlessMode, startup_url: Option<&str>) -> (ShellController, HeadlessEngineFactory) {
    let factory = HeadlessEngineFactory::new(mode);
    let config = ShellConfig {
        data_dir: Some(dir.path().to_path_buf()),
        startup_url: startup_url.map(str::to_string),
    };
    let shell = ShellController::boot(config, Rc::new(factory.clone()));
    (shell, factory)
}

fn selected_engine(shell: &ShellController, factory: &HeadlessEngineFactory) -> HeadlessHandle {
    let id = shell.tabs().selected().unwrap().id();
    factory.handle(id).unwrap()
}

fn read_settings(dir: &TempDir) -> Settings {
    let content = fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
    serde_json::from_str(&content).unwrap()
}

// === Startup ===

#[test]
fn test_fresh_start_opens_home_tab() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);

    assert_eq!(shell.tabs().tab_count(), 1);
    let tab = shell.tabs().selected().unwrap();
    assert_eq!(tab.url(), DEFAULT_HOME_URL);
    assert_eq!(tab.title(), "www.google.com");
    assert_eq!(shell.chrome().address, DEFAULT_HOME_URL);
    assert_eq!(shell.chrome().window_title, "www.google.com");
    assert_eq!(shell.chrome().status, STATUS_DONE);
    assert!(shell.chrome().bookmarks_panel_visible);
    assert!(shell.take_notices().is_empty());
}

#[test]
fn test_restores_saved_tabs_with_titles() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(SETTINGS_FILE),
        r#"{
            "homeUrl": "https://home.test/",
            "openTabs": [
                {"title": "Saved A", "url": "https://a.test/"},
                {"title": "Saved B", "url": "https://b.test/"}
            ]
        }"#,
    )
    .unwrap();

    let (shell, _) = boot(&dir, HeadlessMode::Manual, None);
    let titles: Vec<String> = shell.tabs().tabs().map(|t| t.title().to_string()).collect();
    assert_eq!(titles, vec!["Saved A", "Saved B"]);
    assert_eq!(shell.tabs().selected_index(), Some(1));
    assert_eq!(shell.home_url(), "https://home.test/");
    assert_eq!(shell.chrome().address, "https://b.test/");
}

#[test]
fn test_startup_url_opens_after_restored_session() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = boot(&dir, HeadlessMode::Immediate, Some(" https://example.com/ "));
    let urls: Vec<String> = shell.tabs().tabs().map(|t| t.url().to_string()).collect();
    assert_eq!(urls, vec![DEFAULT_HOME_URL, "https://example.com/"]);
    assert_eq!(shell.tabs().selected_index(), Some(1));
}

#[rstest]
#[case("file:///tmp/page.html", "file:///tmp/page.html")]
#[case("about:blank", BLANK_PAGE)]
#[case("http://localhost:8080/", "http://localhost:8080/")]
#[case("example.com", "example.com")]
fn test_startup_url_is_opened_as_given(#[case] startup: &str, #[case] expected: &str) {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Manual, Some(startup));
    assert_eq!(shell.tabs().selected().unwrap().url(), expected);
    assert_eq!(shell.chrome().address, expected);

    selected_engine(&shell, &factory).complete_initialization(true);
    shell.pump_events();
    let engine = selected_engine(&shell, &factory);
    assert_eq!(engine.navigations(), vec![expected.to_string()]);
}

#[test]
fn test_blank_startup_url_opens_new_tab_page() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = boot(&dir, HeadlessMode::Immediate, Some("about:blank"));
    assert_eq!(shell.tabs().tab_count(), 2);
    assert_eq!(shell.chrome().window_title, NEW_TAB_TITLE);
}

#[test]
fn test_blank_startup_url_is_ignored() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = boot(&dir, HeadlessMode::Immediate, Some("   "));
    assert_eq!(shell.tabs().tab_count(), 1);
}

#[test]
fn test_corrupt_files_become_notices() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(SETTINGS_FILE), "not json").unwrap();
    fs::write(dir.path().join(BOOKMARKS_FILE), "[{").unwrap();

    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    let notices = shell.take_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| matches!(n, Notice::Error(_))));
    assert_eq!(shell.home_url(), DEFAULT_HOME_URL);
    assert!(shell.bookmarks().list().is_empty());
    assert_eq!(shell.tabs().tab_count(), 1);
}

// === Navigation and chrome ===

#[test]
fn test_address_input_is_normalized() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.navigate("  example.org  ");
    shell.pump_events();
    assert_eq!(shell.chrome().address, "https://example.org");
    assert_eq!(shell.chrome().window_title, "example.org");

    shell.navigate("http://plain.test/");
    shell.pump_events();
    assert_eq!(shell.chrome().address, "http://plain.test/");
}

#[test]
fn test_empty_address_input_is_ignored() {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Immediate, None);
    let engine = selected_engine(&shell, &factory);
    let before = engine.navigations().len();
    shell.navigate("   ");
    shell.pump_events();
    assert_eq!(engine.navigations().len(), before);
    assert_eq!(shell.chrome().address, DEFAULT_HOME_URL);
}

#[test]
fn test_back_and_forward() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.navigate("https://second.test/");
    shell.pump_events();

    shell.go_back();
    shell.pump_events();
    assert_eq!(shell.chrome().address, DEFAULT_HOME_URL);

    shell.go_forward();
    shell.pump_events();
    assert_eq!(shell.chrome().address, "https://second.test/");

    // Nothing further forward: no-op.
    shell.go_forward();
    shell.pump_events();
    assert_eq!(shell.chrome().address, "https://second.test/");
    assert!(shell.take_notices().is_empty());
}

#[test]
fn test_go_home_uses_home_url() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.navigate("https://away.test/");
    shell.pump_events();
    shell.go_home();
    shell.pump_events();
    assert_eq!(shell.chrome().address, DEFAULT_HOME_URL);
}

#[test]
fn test_status_follows_selected_tab() {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Manual, None);
    let engine = selected_engine(&shell, &factory);
    engine.complete_initialization(true);
    shell.pump_events();

    engine.start_navigation();
    shell.pump_events();
    assert_eq!(shell.chrome().status, STATUS_LOADING);

    engine.finish_navigation(false, DEFAULT_HOME_URL, "");
    shell.pump_events();
    assert_eq!(shell.chrome().status, STATUS_FAILED);
    assert_eq!(shell.chrome().window_title, "Failed to load");
}

#[test]
fn test_background_tab_does_not_touch_chrome() {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Manual, None);
    let first = selected_engine(&shell, &factory);
    first.complete_initialization(true);
    shell.pump_events();

    shell.new_tab();
    shell.pump_events();
    first.start_navigation();
    first.finish_navigation(true, "https://background.test/", "Background");
    shell.pump_events();

    assert_eq!(shell.chrome().address, "about:blank");
    assert_eq!(shell.chrome().status, STATUS_DONE);
    assert_eq!(shell.tabs().tabs().next().unwrap().title(), "Background");
}

#[test]
fn test_closing_loading_tab_shows_next_tab() {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Manual, Some("https://second.test/"));
    let closing = selected_engine(&shell, &factory);
    closing.complete_initialization(true);
    shell.pump_events();

    // Queued but not yet delivered when the tab goes away.
    closing.start_navigation();
    closing.finish_navigation(false, "https://second.test/", "");
    shell.close_selected_tab();
    shell.pump_events();

    assert_eq!(shell.tabs().tab_count(), 1);
    assert_eq!(shell.chrome().address, DEFAULT_HOME_URL);
    assert_eq!(shell.chrome().window_title, "new tab");
    assert_eq!(shell.chrome().status, STATUS_DONE);
    assert!(shell.take_notices().is_empty());
}

#[test]
fn test_stop_reaches_selected_engine() {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Immediate, None);
    let engine = selected_engine(&shell, &factory);
    shell.stop();
    assert_eq!(engine.stop_count(), 1);
    assert!(shell.take_notices().is_empty());
}

#[test]
fn test_stop_before_ready_is_quiet() {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Manual, None);
    shell.stop();
    assert_eq!(selected_engine(&shell, &factory).stop_count(), 0);
    assert!(shell.take_notices().is_empty());
}

#[test]
fn test_untracked_factory_holds_no_closed_engines() {
    let dir = TempDir::new().unwrap();
    let factory = HeadlessEngineFactory::untracked(HeadlessMode::Immediate);
    let config = ShellConfig {
        data_dir: Some(dir.path().to_path_buf()),
        startup_url: None,
    };
    let mut shell = ShellController::boot(config, Rc::new(factory.clone()));
    for _ in 0..5 {
        shell.new_tab();
        shell.pump_events();
        shell.close_selected_tab();
        shell.pump_events();
    }
    assert_eq!(factory.created(), 6);
    assert_eq!(factory.tracked(), 0);
}

#[test]
fn test_reload_before_ready_is_quiet() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Manual, None);
    shell.reload();
    assert!(shell.take_notices().is_empty());
}

#[test]
fn test_selecting_tab_refreshes_chrome() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, Some("https://second.test/"));
    shell.select_tab(0);
    assert_eq!(shell.chrome().address, DEFAULT_HOME_URL);
    assert_eq!(shell.chrome().window_title, "www.google.com");
    assert_eq!(shell.chrome().status, STATUS_DONE);
}

#[test]
fn test_closing_only_tab_leaves_blank_tab() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.close_selected_tab();
    shell.pump_events();

    assert_eq!(shell.tabs().tab_count(), 1);
    assert_eq!(shell.chrome().address, "about:blank");
    assert_eq!(shell.chrome().window_title, "new tab");
}

#[test]
fn test_close_tab_by_id() {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Immediate, Some("https://second.test/"));
    let first = shell.tabs().tab_ids()[0];
    shell.close_tab(first);
    shell.pump_events();
    assert_eq!(shell.tabs().tab_count(), 1);
    assert!(factory.handle(first).unwrap().is_disposed());
    assert_eq!(shell.chrome().address, "https://second.test/");
}

#[test]
fn test_toggle_bookmarks_panel() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.toggle_bookmarks_panel();
    assert!(!shell.chrome().bookmarks_panel_visible);
    shell.toggle_bookmarks_panel();
    assert!(shell.chrome().bookmarks_panel_visible);
}

// === Bookmarks ===

#[test]
fn test_bookmark_current_page_and_open() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.bookmark_current_page();
    assert_eq!(shell.bookmarks().len(), 1);
    let bookmark = shell.bookmarks().get(0).unwrap().clone();
    assert_eq!(bookmark.title, "www.google.com");
    assert_eq!(bookmark.url, DEFAULT_HOME_URL);
    assert!(dir.path().join(BOOKMARKS_FILE).is_file());

    shell.navigate("https://elsewhere.test/");
    shell.pump_events();
    shell.open_bookmark(0);
    shell.pump_events();
    assert_eq!(shell.tabs().tab_count(), 1);
    assert_eq!(shell.chrome().address, DEFAULT_HOME_URL);

    shell.open_bookmark_in_new_tab(0);
    shell.pump_events();
    assert_eq!(shell.tabs().tab_count(), 2);
    assert_eq!(shell.tabs().selected_index(), Some(1));

    shell.open_bookmark(7);
    shell.open_bookmark_in_new_tab(7);
    assert_eq!(shell.tabs().tab_count(), 2);
}

#[test]
fn test_bookmark_edit_reorder_delete() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    for url in ["a.test", "b.test", "c.test"] {
        shell.navigate(url);
        shell.pump_events();
        shell.bookmark_current_page();
    }
    shell.reorder_bookmark(0, 3);
    shell.edit_bookmark(0, "Bee", "https://b.test");
    shell.delete_bookmark(2);

    let titles: Vec<&str> = shell.bookmarks().list().iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Bee", "c.test"]);
    assert!(shell.take_notices().is_empty());
}

// === Settings ===

#[test]
fn test_set_as_homepage_saves_immediately() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.navigate("https://new-home.test/");
    shell.pump_events();
    shell.set_as_homepage();

    assert_eq!(shell.home_url(), "https://new-home.test/");
    assert_eq!(read_settings(&dir).home_url, "https://new-home.test/");
    let notices = shell.take_notices();
    assert!(matches!(notices.as_slice(), [Notice::Info(_)]));
}

#[test]
fn test_show_about() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.show_about();
    match shell.take_notices().as_slice() {
        [Notice::About(about)] => {
            assert_eq!(about.name, "TabShell");
            assert_eq!(about.version, env!("CARGO_PKG_VERSION"));
        }
        other => panic!("unexpected notices: {:?}", other),
    }
}

// === Shutdown ===

#[test]
fn test_shutdown_persists_session_and_disposes_tabs() {
    let dir = TempDir::new().unwrap();
    let (mut shell, factory) = boot(&dir, HeadlessMode::Immediate, Some("https://second.test/"));
    let geometry = WindowGeometry {
        width: 900.0,
        height: 600.0,
        left: 10.0,
        top: 20.0,
        state: WindowState::Maximized,
    };
    shell.update_geometry(geometry);
    let ids = shell.tabs().tab_ids();

    shell.shutdown();
    assert!(shell.is_shut_down());
    assert_eq!(shell.tabs().tab_count(), 0);
    for id in ids {
        assert!(factory.handle(id).unwrap().is_disposed());
    }

    let saved = read_settings(&dir);
    assert_eq!(saved.geometry(), geometry);
    let urls: Vec<&str> = saved.open_tabs.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(urls, vec![DEFAULT_HOME_URL, "https://second.test/"]);
    assert_eq!(saved.open_tabs[1].title, "second.test");
}

#[test]
fn test_shutdown_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    shell.shutdown();
    shell.shutdown();
    assert_eq!(read_settings(&dir).open_tabs.len(), 1);
}

#[test]
fn test_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let (mut shell, _) = boot(&dir, HeadlessMode::Immediate, Some("https://kept.test/"));
        shell.shutdown();
    }
    let (shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    let urls: Vec<String> = shell.tabs().tabs().map(|t| t.url().to_string()).collect();
    assert_eq!(urls, vec![DEFAULT_HOME_URL.to_string(), "https://kept.test/".to_string()]);
    assert_eq!(shell.session().settings().open_tabs.len(), 2);
}

#[test]
fn test_view_serializes_camel_case() {
    let dir = TempDir::new().unwrap();
    let (shell, _) = boot(&dir, HeadlessMode::Immediate, None);
    let value = serde_json::to_value(shell.view()).unwrap();
    assert_eq!(value["selectedIndex"], 0);
    assert_eq!(value["chrome"]["bookmarksPanelVisible"], true);
    assert_eq!(value["tabs"][0]["loadingState"], "idle");
    assert_eq!(value["homeUrl"], DEFAULT_HOME_URL);
}
