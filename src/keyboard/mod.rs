//! Keyboard-shortcut dispatch core.
//!
//! One registry holds every active (descriptor, handler) entry; one
//! dispatcher forwards raw terminal key events into it; components hold
//! `BindingSession`s that register their handlers on activation, resync
//! when the user's shortcut map changes, and release everything on drop.
//!
//! # Module Structure
//!
//! - `shortcut` - Key-combination descriptors and key-string parsing
//! - `map` - Named actions and the action → descriptor-set table
//! - `registry` - Active handler entries and event dispatch
//! - `dispatcher` - The install-once raw key-event forwarding point
//! - `binding` - Scoped per-component binding sessions

mod binding;
mod dispatcher;
mod map;
mod registry;
mod shortcut;

pub use binding::{BindingError, BindingSession};
pub use dispatcher::{KeyInput, ShortcutDispatcher};
pub use map::{ShortcutAction, ShortcutMap, ShortcutSet};
pub use registry::{OwnerToken, RegistrationHandle, ShortcutHandler, ShortcutRegistry};
pub use shortcut::{parse_shortcut, KeyPhase, Shortcut};
