//! The shortcut definition table — named actions mapped to descriptor sets.
//!
//! A `ShortcutMap` is built once from compiled defaults plus user overrides
//! from config.toml, and replaced wholesale whenever the configuration
//! changes. Consumers detect a change by value inequality against the map
//! they last observed, never by push notification.
use std::collections::HashMap;

use crossterm::event::KeyCode;

use super::shortcut::{parse_shortcut, Shortcut};

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    NavigatePreviousPage,
    NavigateNextPage,
    NavigateFirstPage,
    NavigateLastPage,
    FocusSearch,
    OpenPublicationInfo,
    CloseDialog,
    ShowHelp,
    Quit,
}

impl ShortcutAction {
    pub const ALL: &'static [Self] = &[
        Self::NavigatePreviousPage,
        Self::NavigateNextPage,
        Self::NavigateFirstPage,
        Self::NavigateLastPage,
        Self::FocusSearch,
        Self::OpenPublicationInfo,
        Self::CloseDialog,
        Self::ShowHelp,
        Self::Quit,
    ];

    /// Config key / display name for this action.
    pub fn name(self) -> &'static str {
        match self {
            Self::NavigatePreviousPage => "navigate_previous_page",
            Self::NavigateNextPage => "navigate_next_page",
            Self::NavigateFirstPage => "navigate_first_page",
            Self::NavigateLastPage => "navigate_last_page",
            Self::FocusSearch => "focus_search",
            Self::OpenPublicationInfo => "open_publication_info",
            Self::CloseDialog => "close_dialog",
            Self::ShowHelp => "show_help",
            Self::Quit => "quit",
        }
    }

    /// Human-readable description for `--dump-shortcuts`.
    pub fn describe(self) -> &'static str {
        match self {
            Self::NavigatePreviousPage => "Go to previous catalog page",
            Self::NavigateNextPage => "Go to next catalog page",
            Self::NavigateFirstPage => "Go to first catalog page",
            Self::NavigateLastPage => "Go to last catalog page",
            Self::FocusSearch => "Focus catalog search",
            Self::OpenPublicationInfo => "Open publication info dialog",
            Self::CloseDialog => "Close the active dialog",
            Self::ShowHelp => "Show shortcut help",
            Self::Quit => "Quit the application",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// Shortcut Set
// ============================================================================

/// The descriptors bound to one action: a primary plus any alternates.
///
/// Invariant: every action has at least the primary descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSet {
    pub primary: Shortcut,
    pub alternates: Vec<Shortcut>,
}

impl ShortcutSet {
    pub fn single(primary: Shortcut) -> Self {
        Self {
            primary,
            alternates: Vec::new(),
        }
    }

    pub fn with_alternate(primary: Shortcut, alternate: Shortcut) -> Self {
        Self {
            primary,
            alternates: vec![alternate],
        }
    }

    /// Primary followed by alternates, in binding order.
    pub fn iter(&self) -> impl Iterator<Item = &Shortcut> {
        std::iter::once(&self.primary).chain(self.alternates.iter())
    }
}

// ============================================================================
// Shortcut Map
// ============================================================================

/// Action → descriptor-set table.
///
/// Equality is structural; the binding lifecycle compares the map it last
/// registered against the current one to decide whether to resync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutMap {
    actions: HashMap<ShortcutAction, ShortcutSet>,
}

impl ShortcutMap {
    /// The compiled-in default table.
    pub fn defaults() -> Self {
        let mut actions = HashMap::new();
        actions.insert(
            ShortcutAction::NavigatePreviousPage,
            ShortcutSet::with_alternate(
                Shortcut::ctrl(KeyCode::Left),
                Shortcut::ctrl_shift(KeyCode::Char(',')),
            ),
        );
        actions.insert(
            ShortcutAction::NavigateNextPage,
            ShortcutSet::with_alternate(
                Shortcut::ctrl(KeyCode::Right),
                Shortcut::ctrl_shift(KeyCode::Char('.')),
            ),
        );
        actions.insert(
            ShortcutAction::NavigateFirstPage,
            ShortcutSet::single(Shortcut::ctrl(KeyCode::Home)),
        );
        actions.insert(
            ShortcutAction::NavigateLastPage,
            ShortcutSet::single(Shortcut::ctrl(KeyCode::End)),
        );
        actions.insert(
            ShortcutAction::FocusSearch,
            ShortcutSet::single(Shortcut::ctrl(KeyCode::Char('f'))),
        );
        actions.insert(
            ShortcutAction::OpenPublicationInfo,
            ShortcutSet::single(Shortcut::ctrl(KeyCode::Char('i'))),
        );
        actions.insert(
            ShortcutAction::CloseDialog,
            ShortcutSet::single(Shortcut::plain(KeyCode::Esc)),
        );
        actions.insert(
            ShortcutAction::ShowHelp,
            ShortcutSet::single(Shortcut::plain(KeyCode::F(1))),
        );
        actions.insert(
            ShortcutAction::Quit,
            ShortcutSet::single(Shortcut::ctrl(KeyCode::Char('q'))),
        );
        Self { actions }
    }

    /// Look up the descriptor set for an action.
    pub fn get(&self, action: ShortcutAction) -> Option<&ShortcutSet> {
        self.actions.get(&action)
    }

    /// Apply user overrides from the config `[shortcuts]` table.
    ///
    /// Keys are action names (e.g. "navigate_next_page"); values are key
    /// strings, with `|`-separated alternates after the primary
    /// (e.g. "Ctrl+Right | Ctrl+Shift+Period"). An override replaces the
    /// action's entire descriptor set. The value "none" removes the action
    /// from the table entirely — consumers binding it then get a
    /// configuration error and decide whether to proceed without it.
    ///
    /// Returns warnings for unknown actions or unparseable key strings;
    /// bad overrides leave the default binding intact.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = ShortcutAction::from_name(action_name) else {
                warnings.push(format!("Unknown shortcut action '{}', ignoring", action_name));
                continue;
            };

            if key_str.trim().eq_ignore_ascii_case("none") {
                tracing::info!(action = action.name(), "Shortcut disabled by override");
                self.actions.remove(&action);
                continue;
            }

            let mut parsed = Vec::new();
            let mut bad = None;
            for part in key_str.split('|') {
                match parse_shortcut(part) {
                    Some(sc) => parsed.push(sc),
                    None => {
                        bad = Some(part.trim().to_string());
                        break;
                    }
                }
            }

            if let Some(bad_part) = bad {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', keeping default",
                    bad_part, action_name
                ));
                continue;
            }

            let mut iter = parsed.into_iter();
            let Some(primary) = iter.next() else {
                warnings.push(format!(
                    "Empty binding for action '{}', keeping default",
                    action_name
                ));
                continue;
            };
            let set = ShortcutSet {
                primary,
                alternates: iter.collect(),
            };

            tracing::info!(
                action = action.name(),
                binding = %key_str,
                "Applied shortcut override"
            );
            self.actions.insert(action, set);
        }

        warnings
    }

    /// All bindings in a stable order, for `--dump-shortcuts` output.
    pub fn all_bindings(&self) -> Vec<(ShortcutAction, String, &'static str)> {
        ShortcutAction::ALL
            .iter()
            .filter_map(|&action| {
                self.actions.get(&action).map(|set| {
                    let keys = set
                        .iter()
                        .map(Shortcut::to_string)
                        .collect::<Vec<_>>()
                        .join(" | ");
                    (action, keys, action.describe())
                })
            })
            .collect()
    }
}

impl Default for ShortcutMap {
    fn default() -> Self {
        Self::defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================
