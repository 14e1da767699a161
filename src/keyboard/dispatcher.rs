//! The low-level key listener installation point.
//!
//! The event loop owns the terminal event stream and hands every raw key
//! event to a `ShortcutDispatcher`, which forwards it to the registry once
//! installed. There is exactly one dispatcher, explicitly constructed by the
//! composition root and passed by reference — no hidden process global —
//! but the install-once contract is the same: installation is idempotent
//! and irreversible for the process lifetime.
use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::{KeyEvent, KeyEventKind};

use super::registry::ShortcutRegistry;
use super::shortcut::KeyPhase;

// ============================================================================
// Raw Key Input
// ============================================================================

/// A raw key event as seen by the shortcut system: key identifier, modifier
/// flags, and phase. Built from the terminal event; key-repeat counts as a
/// fresh key-down, matching how the shortcut table is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub code: crossterm::event::KeyCode,
    pub modifiers: crossterm::event::KeyModifiers,
    pub phase: KeyPhase,
}

impl KeyInput {
    pub fn from_key_event(event: &KeyEvent) -> Self {
        let phase = match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => KeyPhase::Down,
            KeyEventKind::Release => KeyPhase::Up,
        };
        Self {
            code: event.code,
            modifiers: event.modifiers,
            phase,
        }
    }
}

// ============================================================================
// ShortcutDispatcher
// ============================================================================

/// Forwards raw key events to the registry's dispatch entry point.
///
/// `ensure_installed` transitions not-installed → installed exactly once;
/// repeated calls are no-ops. There is no teardown: the UI lifecycle never
/// needs one, and events arriving before installation are dropped.
pub struct ShortcutDispatcher {
    registry: Rc<ShortcutRegistry>,
    installed: Cell<bool>,
}

impl ShortcutDispatcher {
    pub fn new(registry: Rc<ShortcutRegistry>) -> Self {
        Self {
            registry,
            installed: Cell::new(false),
        }
    }

    /// The registry this dispatcher forwards to.
    pub fn registry(&self) -> &Rc<ShortcutRegistry> {
        &self.registry
    }

    /// Install the key-event forwarding hook. Idempotent.
    pub fn ensure_installed(&self) {
        if self.installed.replace(true) {
            tracing::trace!("Key listener already installed");
        } else {
            tracing::debug!("Key listener installed");
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get()
    }

    /// Forward one raw key event to the registry. Called once per event by
    /// the event loop. Returns the number of handlers that fired.
    pub fn on_key(&self, event: &KeyEvent) -> usize {
        if !self.installed.get() {
            tracing::trace!(?event, "Dropping key event: listener not installed");
            return 0;
        }
        self.registry.dispatch(&KeyInput::from_key_event(event))
    }
}

// ============================================================================
// Tests
// ============================================================================
