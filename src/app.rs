//! Application state and composition root.
//!
//! `App` owns the shortcut registry, the dispatcher, the navigation history
//! and the dialog layer, and wires the long-lived binding sessions: page
//! navigation plus the app-chrome actions (search, info, help, quit). All
//! mutation happens on the event loop task; shortcut handlers only emit
//! messages that come back through the channels in `AppChannels`.
use std::borrow::Cow;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::Config;
use crate::dialog::{Dialog, DialogController};
use crate::keyboard::{
    BindingError, BindingSession, ShortcutAction, ShortcutDispatcher, ShortcutMap,
    ShortcutRegistry,
};
use crate::opds::{CatalogStore, OpdsFeed, PageNavigation, Publication};
use crate::routing::{History, Route};
use crate::settings::LocaleSettings;

// ============================================================================
// App Events
// ============================================================================

/// Messages emitted by shortcut handlers, applied by the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    FocusSearch,
    OpenPublicationInfo,
    CloseDialog,
    ShowHelp,
    Quit,
}

/// App-chrome actions bound for the whole app lifetime, and the event each
/// one emits.
const CHROME_ACTIONS: [(ShortcutAction, AppEvent); 5] = [
    (ShortcutAction::FocusSearch, AppEvent::FocusSearch),
    (ShortcutAction::OpenPublicationInfo, AppEvent::OpenPublicationInfo),
    (ShortcutAction::CloseDialog, AppEvent::CloseDialog),
    (ShortcutAction::ShowHelp, AppEvent::ShowHelp),
    (ShortcutAction::Quit, AppEvent::Quit),
];

/// Receiving ends of the channels shortcut handlers write into.
pub struct AppChannels {
    pub nav_rx: mpsc::UnboundedReceiver<Route>,
    pub event_rx: mpsc::UnboundedReceiver<AppEvent>,
}

// ============================================================================
// App State
// ============================================================================

pub struct App {
    pub registry: Rc<ShortcutRegistry>,
    pub dispatcher: ShortcutDispatcher,
    pub shortcut_map: ShortcutMap,
    pub store: CatalogStore,
    pub history: History,
    pub locale: LocaleSettings,
    pub dialogs: DialogController,

    /// The catalog page currently on screen.
    pub feed: OpdsFeed,
    /// Selected publication index within `feed`.
    pub selected: usize,

    pub search_focused: bool,
    pub search_query: String,
    pub show_help: bool,
    pub confirm_delete: bool,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub should_quit: bool,

    page_nav: PageNavigation,
    chrome: BindingSession,
}

impl App {
    /// Build the app around a loaded catalog store. Installs the key
    /// listener and binds both long-lived sessions; fails when the catalog
    /// is empty or a navigation action has been unbound in config.
    pub fn new(config: &Config, store: CatalogStore) -> Result<(Self, AppChannels)> {
        let registry = Rc::new(ShortcutRegistry::new());
        let dispatcher = ShortcutDispatcher::new(Rc::clone(&registry));
        let (shortcut_map, _) = config.shortcut_map();
        let locale = LocaleSettings::new(&config.locale)?;

        let start = store
            .start_url()
            .cloned()
            .context("Catalog has no pages to display")?;

        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let page_nav = PageNavigation::mount(&dispatcher, shortcut_map.clone(), nav_tx)
            .context("Page navigation shortcuts could not be bound")?;
        let chrome = Self::mount_chrome(&dispatcher, shortcut_map.clone(), event_tx);

        let mut app = Self {
            registry,
            dispatcher,
            shortcut_map,
            store,
            history: History::new(Route::catalog(start)),
            locale,
            dialogs: DialogController::default(),
            feed: OpdsFeed::default(),
            selected: 0,
            search_focused: false,
            search_query: String::new(),
            show_help: false,
            confirm_delete: config.confirm_delete,
            status_message: None,
            needs_redraw: true,
            should_quit: false,
            page_nav,
            chrome,
        };
        app.apply_current_route();

        Ok((app, AppChannels { nav_rx, event_rx }))
    }

    /// Bind the app-chrome actions. An action unbound in config is logged
    /// and left unreachable rather than failing startup.
    fn mount_chrome(
        dispatcher: &ShortcutDispatcher,
        shortcuts: ShortcutMap,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> BindingSession {
        dispatcher.ensure_installed();
        let mut session = BindingSession::new(Rc::clone(dispatcher.registry()), shortcuts);

        for (action, event) in CHROME_ACTIONS {
            let tx = event_tx.clone();
            let result = session.bind(
                action,
                Rc::new(move |_| {
                    tx.send(event)
                        .map_err(|_| anyhow!("app event channel closed"))?;
                    Ok(())
                }),
            );
            if let Err(BindingError::MissingBinding(action)) = result {
                tracing::warn!(action = action.name(), "Action has no binding and is unreachable");
            }
        }
        session
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Push a route and show it.
    pub fn navigate(&mut self, route: Route) {
        self.history.push(route);
        self.apply_current_route();
    }

    /// Go back one history entry, if there is one.
    pub fn go_back(&mut self) {
        if self.history.back().is_some() {
            self.apply_current_route();
        }
    }

    fn apply_current_route(&mut self) {
        match self.history.current().clone() {
            Route::Catalog(url) => match self.store.get(&url) {
                Some(feed) => {
                    self.feed = feed.clone();
                    self.selected = 0;
                    self.page_nav.set_links(self.feed.links.clone());
                }
                None => {
                    tracing::warn!(url = %url, "Catalog page not in the offline store");
                    self.set_status(format!("Page not available offline: {}", url));
                }
            },
            Route::Help => self.show_help = true,
            Route::Settings => {}
        }
        self.needs_redraw = true;
    }

    // ========================================================================
    // Event Handling
    // ========================================================================

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::FocusSearch => {
                self.search_focused = true;
                self.search_query.clear();
            }
            AppEvent::OpenPublicationInfo => self.open_publication_info(),
            AppEvent::CloseDialog => {
                // Cascade: dialog, then search, then help overlay
                if !self.dialogs.close() {
                    if self.search_focused {
                        self.search_focused = false;
                        self.search_query.clear();
                    } else {
                        self.show_help = false;
                    }
                }
            }
            AppEvent::ShowHelp => self.show_help = !self.show_help,
            AppEvent::Quit => self.should_quit = true,
        }
        self.needs_redraw = true;
    }

    // ========================================================================
    // Selection and Search
    // ========================================================================

    pub fn selected_publication(&self) -> Option<&Publication> {
        self.feed.publications.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.feed.publications.len() {
            self.selected += 1;
            self.needs_redraw = true;
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.needs_redraw = true;
        }
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_query.push(c);
        self.needs_redraw = true;
    }

    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
        self.needs_redraw = true;
    }

    /// Select the first publication whose title contains the query.
    pub fn commit_search(&mut self) {
        self.search_focused = false;
        self.needs_redraw = true;
        let query = self.search_query.trim().to_lowercase();
        if query.is_empty() {
            return;
        }
        let hit = self
            .feed
            .publications
            .iter()
            .position(|p| p.title.to_lowercase().contains(&query));
        match hit {
            Some(i) => {
                let title = self.feed.publications[i].title.clone();
                self.selected = i;
                self.set_status(format!("Matched '{}'", title));
            }
            None => {
                let message = format!("No match for '{}'", self.search_query);
                self.set_status(message);
            }
        }
    }

    // ========================================================================
    // Dialogs
    // ========================================================================

    fn open_publication_info(&mut self) {
        match self.selected_publication() {
            Some(publication) => {
                let publication = publication.clone();
                self.dialogs.open(Dialog::publication_info(publication));
            }
            None => self.set_status("No publication selected"),
        }
    }

    /// "Read" from the publication-info dialog. Opening the reader closes
    /// the dialog; unreadable loans only get a status message.
    pub fn open_reader(&mut self) {
        let Some(dialog) = self.dialogs.current() else {
            return;
        };
        let publication = dialog.publication().clone();
        if !dialog.controls().can_read {
            self.set_status("This loan can no longer be opened");
            self.needs_redraw = true;
            return;
        }
        self.dialogs.close();
        self.set_status(format!("Opening '{}'", publication.title));
        self.needs_redraw = true;
    }

    /// Ask to delete the dialog's publication, or the selected one when no
    /// dialog is open. Honors the `confirm_delete` config switch.
    pub fn request_delete(&mut self) {
        let target = match self.dialogs.current() {
            Some(dialog) => Some(dialog.publication().clone()),
            None => self.selected_publication().cloned(),
        };
        let Some(publication) = target else {
            return;
        };
        if self.confirm_delete {
            self.dialogs.open(Dialog::DeleteConfirm(publication));
        } else {
            self.dialogs.close();
            self.perform_delete(&publication);
        }
        self.needs_redraw = true;
    }

    /// Ask to renew the loan shown in the publication-info dialog. Only
    /// offered when the status document links the renew interaction.
    pub fn request_renew(&mut self) {
        let Some(dialog) = self.dialogs.current() else {
            return;
        };
        let publication = dialog.publication().clone();
        let renew = dialog.controls().renew.map(|l| l.href.clone());
        match renew {
            Some(href) => tracing::debug!(href = %href, "Renew requested"),
            None => {
                self.set_status("Renewal is not available for this loan");
                self.needs_redraw = true;
                return;
            }
        }
        self.dialogs.open(Dialog::LcpRenewConfirm(publication));
        self.needs_redraw = true;
    }

    /// Ask to return the loan shown in the publication-info dialog.
    pub fn request_return(&mut self) {
        let Some(dialog) = self.dialogs.current() else {
            return;
        };
        let publication = dialog.publication().clone();
        let return_link = dialog.controls().return_link.map(|l| l.href.clone());
        match return_link {
            Some(href) => tracing::debug!(href = %href, "Return requested"),
            None => {
                self.set_status("This loan cannot be returned");
                self.needs_redraw = true;
                return;
            }
        }
        self.dialogs.open(Dialog::LcpReturnConfirm(publication));
        self.needs_redraw = true;
    }

    /// Confirm the open confirmation dialog.
    pub fn confirm_dialog(&mut self) {
        let Some(dialog) = self.dialogs.current().cloned() else {
            return;
        };
        match dialog {
            Dialog::DeleteConfirm(publication) => {
                self.dialogs.close();
                self.perform_delete(&publication);
            }
            Dialog::LcpRenewConfirm(publication) => {
                self.dialogs.close();
                self.set_status(format!("Renewal requested for '{}'", publication.title));
            }
            Dialog::LcpReturnConfirm(publication) => {
                self.dialogs.close();
                self.set_status(format!("Return requested for '{}'", publication.title));
            }
            Dialog::PublicationInfo { .. } => {}
        }
        self.needs_redraw = true;
    }

    /// Toggle the description panel of the publication-info dialog.
    pub fn toggle_description(&mut self) {
        if let Some(Dialog::PublicationInfo { description, .. }) = self.dialogs.current_mut() {
            description.toggle();
            self.needs_redraw = true;
        }
    }

    fn perform_delete(&mut self, publication: &Publication) {
        let before = self.feed.publications.len();
        self.feed
            .publications
            .retain(|p| !same_publication(p, publication));
        if self.feed.publications.len() < before {
            if self.selected >= self.feed.publications.len() {
                self.selected = self.feed.publications.len().saturating_sub(1);
            }
            self.set_status(format!("Deleted '{}'", publication.title));
        }
        self.needs_redraw = true;
    }

    // ========================================================================
    // Shortcut Map Replacement
    // ========================================================================

    /// Install a new shortcut map (config reload) and resync every binding
    /// session against it.
    pub fn set_shortcut_map(&mut self, map: ShortcutMap) {
        match self.page_nav.sync_shortcuts(&map) {
            Ok(true) => tracing::info!("Page navigation shortcuts rebound"),
            Ok(false) => {}
            Err(error) => {
                tracing::warn!(%error, "Page navigation partially rebound");
                self.set_status(error.to_string());
            }
        }
        match self.chrome.sync(&map) {
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "App shortcuts partially rebound");
                self.set_status(error.to_string());
            }
        }
        self.shortcut_map = map;
        self.needs_redraw = true;
    }

    // ========================================================================
    // Status Line
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

/// Publications match by identifier when both carry one, by title otherwise.
fn same_publication(a: &Publication, b: &Publication) -> bool {
    match (&a.identifier, &b.identifier) {
        (Some(x), Some(y)) => x == y,
        _ => a.title == b.title,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use url::Url;

    fn page_json(n: u32, total: u32) -> String {
        let mut links = vec![format!(
            r#"{{"rel": "self", "href": "https://example.com/catalog?page={}"}}"#,
            n
        )];
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
                "metadata": {{"title": "Page {}"}},
                "links": [{}],
                "publications": [
                    {{"metadata": {{"title": "Moby-Dick", "identifier": "urn:isbn:001"}}}},
                    {{"metadata": {{"title": "Walden", "identifier": "urn:isbn:002"}}}}
                ]
            }}"#,
            n,
            links.join(",")
        )
    }

    fn test_app() -> (App, AppChannels) {
        let mut store = CatalogStore::new();
        store.load_json(&page_json(1, 2)).unwrap();
        store.load_json(&page_json(2, 2)).unwrap();
        App::new(&Config::default(), store).unwrap()
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_new_shows_start_page() {
        let (app, _channels) = test_app();
        assert_eq!(app.feed.title, "Page 1");
        assert!(app.dispatcher.is_installed());
    }

    #[test]
    fn test_empty_catalog_is_startup_error() {
        let result = App::new(&Config::default(), CatalogStore::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_next_page_shortcut_round_trip() {
        let (mut app, mut channels) = test_app();

        app.dispatcher.on_key(&key(KeyCode::Right, KeyModifiers::CONTROL));
        let route = channels.nav_rx.try_recv().unwrap();
        assert_eq!(
            route,
            Route::catalog(Url::parse("https://example.com/catalog?page=2").unwrap())
        );

        app.navigate(route);
        assert_eq!(app.feed.title, "Page 2");
        assert_eq!(app.history.depth(), 2);
    }

    #[test]
    fn test_navigate_to_missing_page_keeps_current_feed() {
        let (mut app, _channels) = test_app();
        app.navigate(Route::catalog(
            Url::parse("https://example.com/catalog?page=9").unwrap(),
        ));
        assert_eq!(app.feed.title, "Page 1");
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_quit_shortcut_emits_event() {
        let (mut app, mut channels) = test_app();
        app.dispatcher
            .on_key(&key(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert_eq!(channels.event_rx.try_recv().unwrap(), AppEvent::Quit);

        app.handle_event(AppEvent::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_close_cascade_prefers_dialog() {
        let (mut app, _channels) = test_app();
        app.handle_event(AppEvent::ShowHelp);
        app.handle_event(AppEvent::FocusSearch);
        app.handle_event(AppEvent::OpenPublicationInfo);
        assert!(app.dialogs.is_open());

        app.handle_event(AppEvent::CloseDialog);
        assert!(!app.dialogs.is_open());
        assert!(app.search_focused);

        app.handle_event(AppEvent::CloseDialog);
        assert!(!app.search_focused);
        assert!(app.show_help);

        app.handle_event(AppEvent::CloseDialog);
        assert!(!app.show_help);
    }

    #[test]
    fn test_delete_goes_through_confirmation() {
        let (mut app, _channels) = test_app();
        app.request_delete();
        assert!(matches!(
            app.dialogs.current(),
            Some(Dialog::DeleteConfirm(_))
        ));
        // Still there until confirmed
        assert_eq!(app.feed.publications.len(), 2);

        app.confirm_dialog();
        assert!(!app.dialogs.is_open());
        assert_eq!(app.feed.publications.len(), 1);
        assert_eq!(app.feed.publications[0].title, "Walden");
    }

    #[test]
    fn test_delete_without_confirmation_is_immediate() {
        let mut config = Config::default();
        config.confirm_delete = false;
        let mut store = CatalogStore::new();
        store.load_json(&page_json(1, 1)).unwrap();
        let (mut app, _channels) = App::new(&config, store).unwrap();

        app.request_delete();
        assert!(!app.dialogs.is_open());
        assert_eq!(app.feed.publications.len(), 1);
    }

    #[test]
    fn test_renew_not_offered_without_link() {
        let (mut app, _channels) = test_app();
        app.handle_event(AppEvent::OpenPublicationInfo);
        app.request_renew();
        // No renew link on an unprotected publication: stays on info dialog
        assert!(matches!(
            app.dialogs.current(),
            Some(Dialog::PublicationInfo { .. })
        ));
    }

    #[test]
    fn test_search_selects_first_match() {
        let (mut app, _channels) = test_app();
        app.handle_event(AppEvent::FocusSearch);
        for c in "wald".chars() {
            app.push_search_char(c);
        }
        app.commit_search();
        assert!(!app.search_focused);
        assert_eq!(app.selected, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_message_expires_after_three_seconds() {
        let (mut app, _channels) = test_app();
        app.set_status("Deleted 'Walden'");

        assert!(!app.clear_expired_status());
        tokio::time::advance(std::time::Duration::from_secs(2)).await;
        assert!(!app.clear_expired_status());

        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
        // Idempotent once cleared
        assert!(!app.clear_expired_status());
    }

    #[test]
    fn test_set_shortcut_map_rebinds_sessions() {
        let (mut app, mut channels) = test_app();

        let mut overrides = std::collections::HashMap::new();
        overrides.insert("navigate_next_page".to_string(), "n".to_string());
        let mut map = ShortcutMap::defaults();
        map.apply_overrides(&overrides);
        app.set_shortcut_map(map);

        app.dispatcher.on_key(&key(KeyCode::Right, KeyModifiers::CONTROL));
        assert!(channels.nav_rx.try_recv().is_err());

        app.dispatcher.on_key(&key(KeyCode::Char('n'), KeyModifiers::NONE));
        assert!(channels.nav_rx.try_recv().is_ok());
    }
}
