//! Shortcut descriptors — key + exact modifier set + phase.
//!
//! A `Shortcut` is the immutable value a handler is registered against.
//! Matching is structural and exact: key code, modifier set, and phase
//! must all be equal. "Ctrl+s" never matches a "Ctrl+Shift+s" event.
use crossterm::event::{KeyCode, KeyModifiers};
use std::fmt;

// ============================================================================
// Key Phase
// ============================================================================

/// Whether a shortcut fires on key press or key release.
///
/// Terminal key-repeat events count as `Down`; release events are only
/// delivered on terminals supporting the kitty keyboard protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyPhase {
    #[default]
    Down,
    Up,
}

// ============================================================================
// Shortcut Descriptor
// ============================================================================

/// A key-combination descriptor: code + modifiers + phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub phase: KeyPhase,
}

impl Shortcut {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self {
            code,
            modifiers,
            phase: KeyPhase::Down,
        }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    pub const fn ctrl_shift(code: KeyCode) -> Self {
        Self::new(
            code,
            KeyModifiers::CONTROL.union(KeyModifiers::SHIFT),
        )
    }

    pub const fn on_key_up(mut self) -> Self {
        self.phase = KeyPhase::Up;
        self
    }

    /// Exact-match test against a raw key event.
    ///
    /// True iff key code, phase, and the *entire* modifier set match.
    /// No subset or superset matching.
    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers, phase: KeyPhase) -> bool {
        self.code == code && self.modifiers == modifiers && self.phase == phase
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "Alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            write!(f, "Shift+")?;
        }
        if self.modifiers.contains(KeyModifiers::SUPER) {
            write!(f, "Meta+")?;
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "Space")?,
            KeyCode::Char(c) => write!(f, "{}", c)?,
            KeyCode::Enter => write!(f, "Enter")?,
            KeyCode::Esc => write!(f, "Esc")?,
            KeyCode::Tab => write!(f, "Tab")?,
            KeyCode::Backspace => write!(f, "Backspace")?,
            KeyCode::Up => write!(f, "Up")?,
            KeyCode::Down => write!(f, "Down")?,
            KeyCode::Left => write!(f, "Left")?,
            KeyCode::Right => write!(f, "Right")?,
            KeyCode::Home => write!(f, "Home")?,
            KeyCode::End => write!(f, "End")?,
            KeyCode::PageUp => write!(f, "PageUp")?,
            KeyCode::PageDown => write!(f, "PageDown")?,
            KeyCode::F(n) => write!(f, "F{}", n)?,
            other => write!(f, "{:?}", other)?,
        }
        if self.phase == KeyPhase::Up {
            write!(f, "@up")?;
        }
        Ok(())
    }
}

// ============================================================================
// Key-String Parsing
// ============================================================================

/// Parse a key string from config into a `Shortcut`.
///
/// Supported formats:
/// - Single char: "q", "/", ","
/// - Named keys: "Enter", "Esc", "Tab", "Left", "Home", "PageDown", "Space"
/// - Function keys: "F1" through "F12"
/// - Modifier combos: "Ctrl+Left", "Ctrl+Shift+,", "Alt+Enter", "Meta+k"
/// - Key-up phase: "@up" suffix, e.g. "F1@up"
pub fn parse_shortcut(s: &str) -> Option<Shortcut> {
    let s = s.trim();

    let (s, phase) = match s.strip_suffix("@up") {
        Some(rest) => (rest.trim(), KeyPhase::Up),
        None => (s, KeyPhase::Down),
    };

    let mut modifiers = KeyModifiers::NONE;
    let mut rest = s;
    loop {
        let lower_prefix = |p: &str| {
            rest.len() > p.len() && rest[..p.len()].eq_ignore_ascii_case(p)
        };
        if lower_prefix("ctrl+") {
            modifiers |= KeyModifiers::CONTROL;
            rest = &rest[5..];
        } else if lower_prefix("alt+") {
            modifiers |= KeyModifiers::ALT;
            rest = &rest[4..];
        } else if lower_prefix("shift+") {
            modifiers |= KeyModifiers::SHIFT;
            rest = &rest[6..];
        } else if lower_prefix("meta+") {
            modifiers |= KeyModifiers::SUPER;
            rest = &rest[5..];
        } else {
            break;
        }
    }
    let rest = rest.trim();

    let code = parse_key_code(rest)?;
    Some(Shortcut {
        code,
        modifiers,
        phase,
    })
}

fn parse_key_code(s: &str) -> Option<KeyCode> {
    // Named keys (case-insensitive)
    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeyCode::Enter),
        "esc" | "escape" => return Some(KeyCode::Esc),
        "tab" => return Some(KeyCode::Tab),
        "backspace" => return Some(KeyCode::Backspace),
        "up" => return Some(KeyCode::Up),
        "down" => return Some(KeyCode::Down),
        "left" => return Some(KeyCode::Left),
        "right" => return Some(KeyCode::Right),
        "home" => return Some(KeyCode::Home),
        "end" => return Some(KeyCode::End),
        "pageup" => return Some(KeyCode::PageUp),
        "pagedown" => return Some(KeyCode::PageDown),
        "space" => return Some(KeyCode::Char(' ')),
        "comma" => return Some(KeyCode::Char(',')),
        "period" => return Some(KeyCode::Char('.')),
        _ => {}
    }

    // Function keys
    if s.starts_with('F') || s.starts_with('f') {
        if let Ok(n) = s[1..].parse::<u8>() {
            if (1..=12).contains(&n) {
                return Some(KeyCode::F(n));
            }
        }
    }

    // Single character
    if s.chars().count() == 1 {
        return s.chars().next().map(KeyCode::Char);
    }

    None
}

// ============================================================================
// Tests
// ============================================================================
