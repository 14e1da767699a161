//! Catalog page navigation — the shortcut registry's concrete consumer.
//!
//! `PageNavigation` binds the directional shortcuts while a catalog page is
//! on screen and translates fires into route pushes. Navigation is
//! fire-and-forget: the handler sends the route and returns; the event loop
//! applies it to history.
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::keyboard::{BindingError, BindingSession, ShortcutAction, ShortcutDispatcher, ShortcutMap};
use crate::routing::Route;

use super::feed::{OpdsLink, PageLinks};

// ============================================================================
// Direction Resolution
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    First,
    Previous,
    Next,
    Last,
}

/// Resolve a directional request against a page-link set.
///
/// Each direction resolves only through its own link: a Previous request on
/// the first page (no previous link) resolves to nothing — the expected
/// terminal condition, not an error.
pub fn resolve(links: &PageLinks, direction: PageDirection) -> Option<&OpdsLink> {
    match direction {
        PageDirection::First => links.first.as_ref(),
        PageDirection::Previous => links.previous.as_ref(),
        PageDirection::Next => links.next.as_ref(),
        PageDirection::Last => links.last.as_ref(),
    }
}

// ============================================================================
// PageNavigation Component
// ============================================================================

const DIRECTIONAL_ACTIONS: [(ShortcutAction, PageDirection); 4] = [
    (ShortcutAction::NavigatePreviousPage, PageDirection::Previous),
    (ShortcutAction::NavigateNextPage, PageDirection::Next),
    (ShortcutAction::NavigateFirstPage, PageDirection::First),
    (ShortcutAction::NavigateLastPage, PageDirection::Last),
];

/// Binds the four directional shortcuts for the lifetime of a catalog view.
///
/// The link set is shared with the handlers through a cell so page loads
/// update what an already-bound handler resolves against; the binding
/// session itself only changes when the shortcut map does.
pub struct PageNavigation {
    session: BindingSession,
    links: Rc<RefCell<PageLinks>>,
}

impl PageNavigation {
    /// Activate page navigation: installs the key listener if needed and
    /// binds every directional action (primary and alternates).
    pub fn mount(
        dispatcher: &ShortcutDispatcher,
        shortcuts: ShortcutMap,
        nav_tx: mpsc::UnboundedSender<Route>,
    ) -> Result<Self, BindingError> {
        dispatcher.ensure_installed();

        let links = Rc::new(RefCell::new(PageLinks::default()));
        let mut session = BindingSession::new(Rc::clone(dispatcher.registry()), shortcuts);

        for (action, direction) in DIRECTIONAL_ACTIONS {
            let links = Rc::clone(&links);
            let tx = nav_tx.clone();
            session.bind(
                action,
                Rc::new(move |_| {
                    let links = links.borrow();
                    match resolve(&links, direction) {
                        Some(link) => {
                            tx.send(Route::catalog(link.url.clone()))
                                .map_err(|_| anyhow!("navigation channel closed"))?;
                        }
                        None => {
                            tracing::debug!(?direction, "No page link in that direction");
                        }
                    }
                    Ok(())
                }),
            )?;
        }

        Ok(Self { session, links })
    }

    /// Update the link set the handlers resolve against (on page load).
    pub fn set_links(&self, links: PageLinks) {
        *self.links.borrow_mut() = links;
    }

    /// Re-resolve bindings if the shortcut map changed since mount or the
    /// last sync.
    pub fn sync_shortcuts(&mut self, current: &ShortcutMap) -> Result<bool, BindingError> {
        self.session.sync(current)
    }
}

// ============================================================================
// Tests
// ============================================================================
