//! Integration tests for catalog page navigation: shortcut fires travel
//! through the navigation channel into history and the offline page store.
//!
//! Each test builds a small multi-page catalog in memory and drives the
//! dispatcher with raw key events, the same way the event loop does.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use url::Url;

use folio::app::{App, AppChannels};
use folio::config::Config;
use folio::opds::CatalogStore;
use folio::routing::Route;

fn page_json(n: u32, total: u32) -> String {
    let mut links = vec![format!(
        r#"{{"rel": "self", "href": "https://example.com/catalog?page={}"}}"#,
        n
    )];
    links.push(r#"{"rel": "first", "href": "https://example.com/catalog?page=1"}"#.to_string());
    links.push(format!(
        r#"{{"rel": "last", "href": "https://example.com/catalog?page={}"}}"#,
        total
    ));
    if n > 1 {
        links.push(format!(
            r#"{{"rel": "previous", "href": "https://example.com/catalog?page={}"}}"#,
            n - 1
        ));
    }
    if n < total {
        links.push(format!(
            r#"{{"rel": "next", "href": "https://example.com/catalog?page={}"}}"#,
            n + 1
        ));
    }
    format!(
        r#"{{
            "metadata": {{
                "title": "Page {}",
                "numberOfItems": {},
                "itemsPerPage": 2,
                "currentPage": {}
            }},
            "links": [{}],
            "publications": [
                {{"metadata": {{"title": "Book {}-a"}}}},
                {{"metadata": {{"title": "Book {}-b"}}}}
            ]
        }}"#,
        n,
        total * 2,
        n,
        links.join(","),
        n,
        n
    )
}

fn catalog(total: u32) -> CatalogStore {
    let mut store = CatalogStore::new();
    for n in 1..=total {
        store.load_json(&page_json(n, total)).unwrap();
    }
    store
}

fn test_app(config: &Config) -> (App, AppChannels) {
    App::new(config, catalog(3)).unwrap()
}

fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent::new(code, modifiers)
}

/// Fire a key and apply whatever navigation it produced, as the event loop
/// would.
fn fire_and_apply(app: &mut App, channels: &mut AppChannels, key: KeyEvent) {
    app.dispatcher.on_key(&key);
    while let Ok(route) = channels.nav_rx.try_recv() {
        app.navigate(route);
    }
}

// ============================================================================
// Directional Navigation
// ============================================================================

#[test]
fn test_next_walks_forward_page_by_page() {
    let config = Config::default();
    let (mut app, mut channels) = test_app(&config);
    assert_eq!(app.feed.title, "Page 1");

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 2");
    assert_eq!(app.feed.page_info.indicator().as_deref(), Some("2 / 3"));

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 3");
}

#[test]
fn test_next_on_last_page_is_inert() {
    let config = Config::default();
    let (mut app, mut channels) = test_app(&config);
    fire_and_apply(&mut app, &mut channels, press(KeyCode::End, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 3");
    let depth = app.history.depth();

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 3");
    assert_eq!(app.history.depth(), depth);
}

#[test]
fn test_previous_on_first_page_is_inert() {
    let config = Config::default();
    let (mut app, mut channels) = test_app(&config);

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Left, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 1");
    assert_eq!(app.history.depth(), 1);
}

#[test]
fn test_first_and_last_jump_directly() {
    let config = Config::default();
    let (mut app, mut channels) = test_app(&config);

    fire_and_apply(&mut app, &mut channels, press(KeyCode::End, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 3");

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Home, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 1");
}

#[test]
fn test_alternate_descriptor_navigates_too() {
    let config = Config::default();
    let (mut app, mut channels) = test_app(&config);

    fire_and_apply(
        &mut app,
        &mut channels,
        press(KeyCode::Char('.'), KeyModifiers::CONTROL | KeyModifiers::SHIFT),
    );
    assert_eq!(app.feed.title, "Page 2");

    fire_and_apply(
        &mut app,
        &mut channels,
        press(KeyCode::Char(','), KeyModifiers::CONTROL | KeyModifiers::SHIFT),
    );
    assert_eq!(app.feed.title, "Page 1");
}

#[test]
fn test_modifier_superset_does_not_navigate() {
    let config = Config::default();
    let (mut app, mut channels) = test_app(&config);

    fire_and_apply(
        &mut app,
        &mut channels,
        press(KeyCode::Right, KeyModifiers::CONTROL | KeyModifiers::ALT),
    );
    assert_eq!(app.feed.title, "Page 1");
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_back_retraces_navigation() {
    let config = Config::default();
    let (mut app, mut channels) = test_app(&config);

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::CONTROL));
    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 3");

    app.go_back();
    assert_eq!(app.feed.title, "Page 2");
    app.go_back();
    assert_eq!(app.feed.title, "Page 1");
    // Oldest entry: back is a no-op
    app.go_back();
    assert_eq!(app.feed.title, "Page 1");
}

// ============================================================================
// Config Overrides
// ============================================================================

#[test]
fn test_configured_override_replaces_default_binding() {
    let mut config = Config::default();
    config
        .shortcuts
        .insert("navigate_next_page".to_string(), "n | PageDown".to_string());
    let (mut app, mut channels) = test_app(&config);

    // The default no longer navigates
    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 1");

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Char('n'), KeyModifiers::NONE));
    assert_eq!(app.feed.title, "Page 2");
    fire_and_apply(&mut app, &mut channels, press(KeyCode::PageDown, KeyModifiers::NONE));
    assert_eq!(app.feed.title, "Page 3");
}

#[test]
fn test_runtime_map_swap_rebinds_navigation() {
    let config = Config::default();
    let (mut app, mut channels) = test_app(&config);

    let mut overrides = HashMap::new();
    overrides.insert("navigate_next_page".to_string(), "Alt+Right".to_string());
    let mut map = folio::keyboard::ShortcutMap::defaults();
    map.apply_overrides(&overrides);
    app.set_shortcut_map(map);

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 1");
    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::ALT));
    assert_eq!(app.feed.title, "Page 2");
}

#[test]
fn test_unbinding_navigation_action_fails_startup() {
    let mut config = Config::default();
    config
        .shortcuts
        .insert("navigate_next_page".to_string(), "none".to_string());

    let result = App::new(&config, catalog(3));
    assert!(result.is_err());
}

// ============================================================================
// Offline Store Lookups
// ============================================================================

#[test]
fn test_navigation_to_unloaded_page_reports_status() {
    let config = Config::default();
    let mut store = CatalogStore::new();
    // Page 1 links to page 2, which was never fetched
    store.load_json(&page_json(1, 2)).unwrap();
    let (mut app, mut channels) = App::new(&config, store).unwrap();

    fire_and_apply(&mut app, &mut channels, press(KeyCode::Right, KeyModifiers::CONTROL));
    assert_eq!(app.feed.title, "Page 1");
    let (message, _) = app.status_message.as_ref().expect("status set");
    assert!(message.contains("not available offline"));
    // The attempted route still lands in history
    assert_eq!(
        *app.history.current(),
        Route::catalog(Url::parse("https://example.com/catalog?page=2").unwrap())
    );
}
