//! Configuration file parser for ~/.config/folio/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Parsing is permissive about unknown top-level keys (logged, not fatal)
//! and strict about value types, so a typo'd key degrades gracefully while
//! a wrong value is caught at load time.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::keyboard::ShortcutMap;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// UI locale tag (e.g., "en", "fr", "pt-BR").
    pub locale: String,

    /// Default catalog to open when none is given on the command line.
    pub catalog_url: Option<String>,

    /// Whether deleting a publication asks for confirmation first.
    pub confirm_delete: bool,

    /// Custom shortcut overrides. Keys are action names, values are key
    /// strings ("Ctrl+Right", "Ctrl+Shift+." — alternates separated by `|`,
    /// "none" to unbind the action).
    pub shortcuts: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            catalog_url: None,
            confirm_delete: true,
            shortcuts: HashMap::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = ["locale", "catalog_url", "confirm_delete", "shortcuts"];

    /// Load configuration from a TOML file.
    ///
    /// A missing or empty file yields the defaults. Invalid TOML is an
    /// error; unknown top-level keys only warn, so an old binary tolerates
    /// a newer config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Size check before reading so a corrupted or runaway config file
        // cannot exhaust memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            // File deleted between the metadata call and the read
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys().filter(|k| !Self::KNOWN_KEYS.contains(&k.as_str())) {
                tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), locale = %config.locale, "Loaded configuration");
        Ok(config)
    }

    /// Build the effective shortcut map: defaults with the `[shortcuts]`
    /// overrides applied. Returns the map together with a warning per
    /// override that could not be applied (unknown action, unparseable key).
    pub fn shortcut_map(&self) -> (ShortcutMap, Vec<String>) {
        let mut map = ShortcutMap::defaults();
        let warnings = map.apply_overrides(&self.shortcuts);
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Ignoring shortcut override");
        }
        (map, warnings)
    }
}

// ============================================================================
// Tests
// ============================================================================
