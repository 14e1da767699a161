//! Input routing.
//!
//! Every key event goes through the shortcut dispatcher first, so configured
//! bindings always win. Keys no registered shortcut consumed fall through to
//! view-local handling: the search field, the open dialog, or the catalog
//! list, in that order.
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, AppEvent};
use crate::dialog::Dialog;

/// Result of handling a key press event.
pub enum Action {
    Continue,
    Quit,
}

pub fn handle_input(app: &mut App, key: &KeyEvent) -> Action {
    let fired = app.dispatcher.on_key(key);
    if fired > 0 {
        app.needs_redraw = true;
        return Action::Continue;
    }

    // View-local keys react to presses only; release phases are shortcut
    // territory.
    if key.kind == KeyEventKind::Release {
        return Action::Continue;
    }

    // Always-available escape hatch, independent of the shortcut map
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if app.search_focused {
        handle_search_input(app, key);
    } else if app.dialogs.is_open() {
        handle_dialog_input(app, key);
    } else {
        return handle_catalog_input(app, key);
    }
    Action::Continue
}

fn handle_search_input(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.push_search_char(c);
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Enter => app.commit_search(),
        _ => {}
    }
}

fn handle_dialog_input(app: &mut App, key: &KeyEvent) {
    let confirming = matches!(
        app.dialogs.current(),
        Some(Dialog::DeleteConfirm(_) | Dialog::LcpRenewConfirm(_) | Dialog::LcpReturnConfirm(_))
    );
    if confirming {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_dialog(),
            KeyCode::Char('n') => {
                app.dialogs.close();
                app.needs_redraw = true;
            }
            _ => {}
        }
        return;
    }

    // Publication info dialog
    match key.code {
        KeyCode::Enter => app.open_reader(),
        KeyCode::Char('r') => app.request_renew(),
        KeyCode::Char('t') => app.request_return(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('m') => app.toggle_description(),
        _ => {}
    }
}

fn handle_catalog_input(app: &mut App, key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Enter => app.handle_event(AppEvent::OpenPublicationInfo),
        KeyCode::Backspace => app.go_back(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('q') => return Action::Quit,
        _ => {}
    }
    Action::Continue
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::opds::CatalogStore;

    fn test_app() -> App {
        let mut store = CatalogStore::new();
        store
            .load_json(
                r#"{
                    "metadata": {"title": "Page 1"},
                    "links": [{"rel": "self", "href": "https://example.com/catalog?page=1"}],
                    "publications": [
                        {"metadata": {"title": "Moby-Dick"}},
                        {"metadata": {"title": "Walden"}}
                    ]
                }"#,
            )
            .unwrap();
        let (app, _channels) = App::new(&Config::default(), store).unwrap();
        app
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_list_keys_move_selection() {
        let mut app = test_app();
        handle_input(&mut app, &press(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(app.selected, 1);
        handle_input(&mut app, &press(KeyCode::Char('k'), KeyModifiers::NONE));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = test_app();
        assert!(matches!(
            handle_input(&mut app, &press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        ));
    }

    #[test]
    fn test_search_captures_characters() {
        let mut app = test_app();
        app.handle_event(AppEvent::FocusSearch);
        for c in "wal".chars() {
            handle_input(&mut app, &press(KeyCode::Char(c), KeyModifiers::NONE));
        }
        assert_eq!(app.search_query, "wal");

        // 'j' goes into the query, not the selection
        handle_input(&mut app, &press(KeyCode::Char('j'), KeyModifiers::NONE));
        assert_eq!(app.selected, 0);
        assert_eq!(app.search_query, "walj");
    }

    #[test]
    fn test_shortcut_wins_over_view_local_key() {
        let mut app = test_app();
        app.handle_event(AppEvent::FocusSearch);
        // Esc is bound to close_dialog; it must not land in the search field
        handle_input(&mut app, &press(KeyCode::Esc, KeyModifiers::NONE));
        // The handler emits an event; search stays focused until it is applied
        assert!(app.search_focused);
    }

    #[test]
    fn test_confirm_dialog_keys() {
        let mut app = test_app();
        app.request_delete();
        handle_input(&mut app, &press(KeyCode::Char('n'), KeyModifiers::NONE));
        assert!(!app.dialogs.is_open());
        assert_eq!(app.feed.publications.len(), 2);

        app.request_delete();
        handle_input(&mut app, &press(KeyCode::Char('y'), KeyModifiers::NONE));
        assert_eq!(app.feed.publications.len(), 1);
    }
}
