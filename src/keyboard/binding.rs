//! Scoped binding sessions — the lifecycle contract between a UI component
//! and the handler registry.
//!
//! A component acquires a `BindingSession` when it becomes active, binds the
//! actions it cares about, and drops the session when it deactivates. The
//! session records what was bound so it can re-register everything against a
//! new shortcut map when the configuration changes. Dropping the session
//! releases every entry it owns.
use std::rc::Rc;

use thiserror::Error;

use super::map::{ShortcutAction, ShortcutMap};
use super::registry::{OwnerToken, ShortcutHandler, ShortcutRegistry};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BindingError {
    /// The requested action has no descriptor in the observed shortcut map.
    /// Reported synchronously at registration time; the caller decides
    /// whether to proceed without the binding.
    #[error("no shortcut bound for action '{}'", .0.name())]
    MissingBinding(ShortcutAction),
}

// ============================================================================
// BindingSession
// ============================================================================

/// The scoped lifetime during which a component's shortcut handlers are
/// active in the registry.
///
/// Primary and alternate descriptors of a bound action are registered as
/// separate entries sharing one handler and this session's owner token.
pub struct BindingSession {
    registry: Rc<ShortcutRegistry>,
    owner: OwnerToken,
    observed: ShortcutMap,
    bindings: Vec<(ShortcutAction, ShortcutHandler)>,
}

impl BindingSession {
    /// Open a session against the shortcut map the component currently
    /// observes. Issues a fresh owner token.
    pub fn new(registry: Rc<ShortcutRegistry>, shortcuts: ShortcutMap) -> Self {
        let owner = registry.issue_owner();
        Self {
            registry,
            owner,
            observed: shortcuts,
            bindings: Vec::new(),
        }
    }

    pub fn owner(&self) -> OwnerToken {
        self.owner
    }

    /// The map this session last registered against.
    pub fn observed(&self) -> &ShortcutMap {
        &self.observed
    }

    /// Bind a handler to an action: one registry entry per descriptor in
    /// the action's set. Fails synchronously if the observed map has no
    /// descriptor for the action.
    pub fn bind(
        &mut self,
        action: ShortcutAction,
        handler: ShortcutHandler,
    ) -> Result<(), BindingError> {
        let set = self
            .observed
            .get(action)
            .ok_or(BindingError::MissingBinding(action))?;
        for shortcut in set.iter() {
            self.registry.register(*shortcut, handler.clone(), self.owner);
        }
        self.bindings.push((action, handler));
        Ok(())
    }

    /// Re-resolve this session against the current shortcut map.
    ///
    /// No-op (returns `Ok(false)`) when the map is value-equal to the one
    /// last observed. Otherwise every entry owned by this session is
    /// unregistered and every recorded binding re-registered against the
    /// new map before returning — single-threaded, so no event can be
    /// dispatched against a half-updated entry set.
    ///
    /// An action that lost its descriptors in the new map is skipped (its
    /// handler simply stops firing) and reported as the error; bindings for
    /// actions still present are registered regardless.
    pub fn sync(&mut self, current: &ShortcutMap) -> Result<bool, BindingError> {
        if self.observed == *current {
            return Ok(false);
        }

        let removed = self.registry.unregister_all(self.owner);
        self.observed = current.clone();

        let mut missing = None;
        for (action, handler) in &self.bindings {
            match self.observed.get(*action) {
                Some(set) => {
                    for shortcut in set.iter() {
                        self.registry
                            .register(*shortcut, handler.clone(), self.owner);
                    }
                }
                None => {
                    tracing::warn!(
                        action = action.name(),
                        "Shortcut map no longer binds action; handler disabled"
                    );
                    missing.get_or_insert(BindingError::MissingBinding(*action));
                }
            }
        }

        tracing::debug!(
            owner = ?self.owner,
            removed,
            registered = self.registry.owned_count(self.owner),
            "Resynced binding session to new shortcut map"
        );

        match missing {
            Some(err) => Err(err),
            None => Ok(true),
        }
    }
}

impl Drop for BindingSession {
    fn drop(&mut self) {
        self.registry.unregister_all(self.owner);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::dispatcher::KeyInput;
    use crate::keyboard::shortcut::KeyPhase;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::cell::Cell;
    use std::collections::HashMap;

    fn input(code: KeyCode, modifiers: KeyModifiers) -> KeyInput {
        KeyInput {
            code,
            modifiers,
            phase: KeyPhase::Down,
        }
    }

    fn counting_handler(count: Rc<Cell<u32>>) -> ShortcutHandler {
        Rc::new(move |_| {
            count.set(count.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn test_bind_registers_primary_and_alternates() {
        let registry = Rc::new(ShortcutRegistry::new());
        let mut session = BindingSession::new(registry.clone(), ShortcutMap::defaults());
        let count = Rc::new(Cell::new(0));

        session
            .bind(
                ShortcutAction::NavigatePreviousPage,
                counting_handler(count.clone()),
            )
            .unwrap();

        // Default: Ctrl+Left primary, Ctrl+Shift+, alternate
        assert_eq!(registry.owned_count(session.owner()), 2);
        registry.dispatch(&input(KeyCode::Left, KeyModifiers::CONTROL));
        registry.dispatch(&input(
            KeyCode::Char(','),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        ));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_drop_unregisters_everything() {
        let registry = Rc::new(ShortcutRegistry::new());
        {
            let mut session = BindingSession::new(registry.clone(), ShortcutMap::defaults());
            session
                .bind(ShortcutAction::CloseDialog, Rc::new(|_| Ok(())))
                .unwrap();
            session
                .bind(ShortcutAction::ShowHelp, Rc::new(|_| Ok(())))
                .unwrap();
            assert_eq!(registry.len(), 2);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sync_noop_when_map_unchanged() {
        let registry = Rc::new(ShortcutRegistry::new());
        let mut session = BindingSession::new(registry.clone(), ShortcutMap::defaults());
        session
            .bind(ShortcutAction::CloseDialog, Rc::new(|_| Ok(())))
            .unwrap();

        let resynced = session.sync(&ShortcutMap::defaults()).unwrap();
        assert!(!resynced);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sync_rebinds_against_new_map() {
        let registry = Rc::new(ShortcutRegistry::new());
        let mut session = BindingSession::new(registry.clone(), ShortcutMap::defaults());
        let count = Rc::new(Cell::new(0));
        session
            .bind(ShortcutAction::CloseDialog, counting_handler(count.clone()))
            .unwrap();

        // Old binding fires
        registry.dispatch(&input(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(count.get(), 1);

        // Swap Esc → q
        let mut new_map = ShortcutMap::defaults();
        let mut overrides = HashMap::new();
        overrides.insert("close_dialog".to_string(), "q".to_string());
        new_map.apply_overrides(&overrides);

        let resynced = session.sync(&new_map).unwrap();
        assert!(resynced);

        // Zero entries reference the old descriptor, exactly one the new
        registry.dispatch(&input(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(count.get(), 1);
        registry.dispatch(&input(KeyCode::Char('q'), KeyModifiers::NONE));
        assert_eq!(count.get(), 2);
        assert_eq!(registry.owned_count(session.owner()), 1);
    }

    #[test]
    fn test_sync_never_double_registers() {
        let registry = Rc::new(ShortcutRegistry::new());
        let mut session = BindingSession::new(registry.clone(), ShortcutMap::defaults());
        let count = Rc::new(Cell::new(0));
        session
            .bind(
                ShortcutAction::NavigateNextPage,
                counting_handler(count.clone()),
            )
            .unwrap();

        // Change an unrelated action so the maps differ but next-page keeps
        // its descriptors.
        let mut new_map = ShortcutMap::defaults();
        let mut overrides = HashMap::new();
        overrides.insert("show_help".to_string(), "F2".to_string());
        new_map.apply_overrides(&overrides);

        session.sync(&new_map).unwrap();

        registry.dispatch(&input(KeyCode::Right, KeyModifiers::CONTROL));
        assert_eq!(count.get(), 1, "exactly one firing after resync");
    }

    #[test]
    fn test_bind_missing_action_is_configuration_error() {
        let registry = Rc::new(ShortcutRegistry::new());
        let mut map = ShortcutMap::defaults();
        let mut overrides = HashMap::new();
        overrides.insert("show_help".to_string(), "none".to_string());
        map.apply_overrides(&overrides);

        let mut session = BindingSession::new(registry.clone(), map);
        let err = session
            .bind(ShortcutAction::ShowHelp, Rc::new(|_| Ok(())))
            .unwrap_err();
        assert_eq!(err, BindingError::MissingBinding(ShortcutAction::ShowHelp));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sync_reports_action_dropped_from_new_map() {
        let registry = Rc::new(ShortcutRegistry::new());
        let mut session = BindingSession::new(registry.clone(), ShortcutMap::defaults());
        let count = Rc::new(Cell::new(0));
        session
            .bind(ShortcutAction::ShowHelp, counting_handler(count.clone()))
            .unwrap();
        session
            .bind(ShortcutAction::CloseDialog, Rc::new(|_| Ok(())))
            .unwrap();

        let mut new_map = ShortcutMap::defaults();
        let mut overrides = HashMap::new();
        overrides.insert("show_help".to_string(), "none".to_string());
        new_map.apply_overrides(&overrides);

        let err = session.sync(&new_map).unwrap_err();
        assert_eq!(err, BindingError::MissingBinding(ShortcutAction::ShowHelp));

        // The surviving action is still bound; the dropped one is inert.
        assert_eq!(registry.owned_count(session.owner()), 1);
        registry.dispatch(&input(KeyCode::F(1), KeyModifiers::NONE));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_two_sessions_are_isolated() {
        let registry = Rc::new(ShortcutRegistry::new());
        let mut a = BindingSession::new(registry.clone(), ShortcutMap::defaults());
        let mut b = BindingSession::new(registry.clone(), ShortcutMap::defaults());
        let count_b = Rc::new(Cell::new(0));

        a.bind(ShortcutAction::CloseDialog, Rc::new(|_| Ok(())))
            .unwrap();
        b.bind(ShortcutAction::CloseDialog, counting_handler(count_b.clone()))
            .unwrap();

        drop(a);
        assert_eq!(registry.len(), 1);
        registry.dispatch(&input(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(count_b.get(), 1);
    }
}
