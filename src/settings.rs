//! Locale settings.
//!
//! The client ships a fixed set of translations; the active locale is
//! chosen from that table and persists through config. Unsupported tags are
//! a caller-visible error, not a silent fallback, so a typo in config is
//! reported instead of quietly showing English.
use thiserror::Error;

/// Languages the client ships translations for: tag → native display name.
pub const AVAILABLE_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("fr", "Français"),
    ("de", "Deutsch"),
    ("es", "Español"),
    ("it", "Italiano"),
    ("ja", "日本語"),
    ("nl", "Nederlands"),
    ("pt-BR", "Português (Brasil)"),
    ("ru", "Русский"),
    ("zh-CN", "简体中文"),
];

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Unsupported locale '{0}'")]
    UnsupportedLocale(String),
}

/// Display name for a locale tag, if shipped.
pub fn display_name(tag: &str) -> Option<&'static str> {
    AVAILABLE_LANGUAGES
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, name)| *name)
}

// ============================================================================
// LocaleSettings
// ============================================================================

/// The active locale. Construction and mutation both validate against the
/// shipped language table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    locale: String,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl LocaleSettings {
    pub fn new(tag: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        settings.set_locale(tag)?;
        Ok(settings)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn display_name(&self) -> &'static str {
        // Invariant: the active locale is always in the shipped table.
        display_name(&self.locale).unwrap_or("English")
    }

    pub fn set_locale(&mut self, tag: &str) -> Result<(), SettingsError> {
        if display_name(tag).is_none() {
            return Err(SettingsError::UnsupportedLocale(tag.to_string()));
        }
        if self.locale != tag {
            tracing::info!(from = %self.locale, to = %tag, "Locale changed");
            self.locale = tag.to_string();
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
