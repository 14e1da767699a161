//! Routes and navigation history.
//!
//! Shortcut handlers never navigate directly; they emit a route push that
//! the event loop applies to the history stack, mirroring how every other
//! navigation source (links, dialogs) goes through the same funnel.
use url::Url;

/// A navigable location in the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A catalog page, addressed by its feed URL.
    Catalog(Url),
    Settings,
    Help,
}

impl Route {
    /// Route for an OPDS page link target.
    pub fn catalog(url: Url) -> Self {
        Self::Catalog(url)
    }
}

// ============================================================================
// History
// ============================================================================

/// Linear navigation history. Pushing while not at the newest entry is not
/// modeled — the client has no forward navigation.
#[derive(Debug, Clone)]
pub struct History {
    stack: Vec<Route>,
}

impl History {
    pub fn new(initial: Route) -> Self {
        Self {
            stack: vec![initial],
        }
    }

    pub fn current(&self) -> &Route {
        // Invariant: the stack is never empty.
        self.stack.last().expect("history stack is never empty")
    }

    /// Push a new location. Pushing the current location again is a no-op
    /// so repeated shortcut fires on the same page do not pile up entries.
    pub fn push(&mut self, route: Route) {
        if *self.current() == route {
            tracing::debug!(?route, "Ignoring navigation to current location");
            return;
        }
        tracing::debug!(?route, depth = self.stack.len() + 1, "Navigating");
        self.stack.push(route);
    }

    /// Go back one entry. Returns the new current route, or `None` when
    /// already at the oldest entry.
    pub fn back(&mut self) -> Option<&Route> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.stack.pop();
        Some(self.current())
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
