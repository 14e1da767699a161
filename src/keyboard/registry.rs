//! The handler registry — active (descriptor, handler, owner) entries and
//! the dispatch entry point.
//!
//! The registry is the only shared mutable state in the shortcut system.
//! It is single-threaded by construction (`Rc`/`RefCell`): all mutation and
//! all dispatch happen on the event loop, so register/unregister are atomic
//! with respect to event processing and no locking exists.
use std::cell::RefCell;
use std::rc::Rc;

use super::dispatcher::KeyInput;
use super::shortcut::Shortcut;

/// A shortcut callback. Side-effecting only; errors are isolated per-handler
/// and logged by dispatch. Identity (for deduplication and for
/// `unregister_handler`) is `Rc` pointer identity.
pub type ShortcutHandler = Rc<dyn Fn(&KeyInput) -> anyhow::Result<()>>;

/// Identifies all entries registered by one consumer instance, so they can
/// be removed as a batch. Issued by the registry; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerToken(u64);

/// Opaque handle to a single registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle(u64);

struct Entry {
    id: u64,
    shortcut: Shortcut,
    handler: ShortcutHandler,
    owner: OwnerToken,
}

#[derive(Default)]
struct Inner {
    /// Registration order is dispatch order.
    entries: Vec<Entry>,
    next_entry_id: u64,
    next_owner_id: u64,
}

// ============================================================================
// ShortcutRegistry
// ============================================================================

/// Registry of active shortcut handlers.
///
/// Invariant: no two live entries share an identical (descriptor, handler)
/// pair — re-registration is deduplicated, never stacked, so a single key
/// event can never double-invoke one handler through one descriptor.
#[derive(Default)]
pub struct ShortcutRegistry {
    inner: RefCell<Inner>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh owner token for a consumer instance.
    pub fn issue_owner(&self) -> OwnerToken {
        let mut inner = self.inner.borrow_mut();
        let token = OwnerToken(inner.next_owner_id);
        inner.next_owner_id += 1;
        token
    }

    /// Add an entry. Registering an identical (descriptor, handler) pair a
    /// second time is deduplicated: a warning is logged and the existing
    /// entry's handle is returned, regardless of owner.
    pub fn register(
        &self,
        shortcut: Shortcut,
        handler: ShortcutHandler,
        owner: OwnerToken,
    ) -> RegistrationHandle {
        let mut inner = self.inner.borrow_mut();

        if let Some(existing) = inner
            .entries
            .iter()
            .find(|e| e.shortcut == shortcut && Rc::ptr_eq(&e.handler, &handler))
        {
            tracing::warn!(
                shortcut = %shortcut,
                entry = existing.id,
                "Duplicate shortcut registration deduplicated"
            );
            return RegistrationHandle(existing.id);
        }

        let id = inner.next_entry_id;
        inner.next_entry_id += 1;
        inner.entries.push(Entry {
            id,
            shortcut,
            handler,
            owner,
        });
        tracing::debug!(shortcut = %shortcut, entry = id, owner = ?owner, "Registered shortcut handler");
        RegistrationHandle(id)
    }

    /// Remove a single entry. Unknown handles are a no-op.
    pub fn unregister(&self, handle: RegistrationHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.id != handle.0);
        before != inner.entries.len()
    }

    /// Remove every entry holding this exact handler (pointer identity),
    /// across all descriptors. Unknown handlers are a no-op — unmount paths
    /// may race with configuration reloads that already swapped entries out.
    pub fn unregister_handler(&self, handler: &ShortcutHandler) -> usize {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|e| !Rc::ptr_eq(&e.handler, handler));
        before - inner.entries.len()
    }

    /// Remove every entry owned by `owner`. Returns the number removed;
    /// zero is a valid outcome, not an error.
    pub fn unregister_all(&self, owner: OwnerToken) -> usize {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.owner != owner);
        let removed = before - inner.entries.len();
        if removed > 0 {
            tracing::debug!(owner = ?owner, removed, "Unregistered owner's shortcut entries");
        }
        removed
    }

    /// Match one raw key event against all active entries and invoke every
    /// match, in registration order. Returns the number of handlers invoked.
    ///
    /// Dispatch iterates a snapshot taken here: a handler that unregisters
    /// entries mid-flight cannot cause a removed handler to fire twice or a
    /// remaining snapshot entry to be skipped. A failing handler is logged
    /// and does not stop the rest of the snapshot from firing.
    pub fn dispatch(&self, input: &KeyInput) -> usize {
        let snapshot: Vec<(u64, Shortcut, ShortcutHandler)> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|e| e.shortcut.matches(input.code, input.modifiers, input.phase))
            .map(|e| (e.id, e.shortcut, Rc::clone(&e.handler)))
            .collect();
        // The borrow is released before any handler runs, so handlers may
        // re-enter register/unregister.

        for (id, shortcut, handler) in &snapshot {
            if let Err(error) = handler(input) {
                tracing::warn!(
                    entry = id,
                    shortcut = %shortcut,
                    error = %error,
                    "Shortcut handler failed; continuing dispatch"
                );
            }
        }
        snapshot.len()
    }

    /// Number of active entries.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Number of active entries held by `owner`.
    pub fn owned_count(&self, owner: OwnerToken) -> usize {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|e| e.owner == owner)
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================
