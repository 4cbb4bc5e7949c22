//! UI preferences persisted on the device.

use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::storage::{Storage, keys};

/// Default UI locale.
pub const DEFAULT_LOCALE: &str = "en";

/// Color scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown theme: {0}")]
pub struct UnknownTheme(String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct Current {
    theme: Theme,
    locale: String,
}

/// Theme and locale, loaded with defaults when absent or unreadable.
#[derive(Debug)]
pub struct Preferences {
    storage: Storage,
    current: RwLock<Current>,
}

impl Preferences {
    #[must_use]
    pub fn load(storage: Storage) -> Self {
        let current = Current {
            theme: storage.load_or_none(keys::THEME).unwrap_or_default(),
            locale: storage
                .load_or_none::<String>(keys::LOCALE)
                .filter(|locale| !locale.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
        };
        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .theme
    }

    #[must_use]
    pub fn locale(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .locale
            .clone()
    }

    /// Switch theme and persist it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if it cannot be persisted.
    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.storage.save(keys::THEME, &theme)?;
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .theme = theme;
        Ok(())
    }

    /// Switch locale and persist it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if it cannot be persisted.
    pub fn set_locale(&self, locale: &str) -> Result<()> {
        let locale = locale.trim();
        self.storage.save(keys::LOCALE, locale)?;
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .locale = locale.to_string();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let prefs = Preferences::load(Storage::memory());
        assert_eq!(prefs.theme(), Theme::Light);
        assert_eq!(prefs.locale(), "en");
    }

    #[test]
    fn test_preferences_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load(Storage::file(dir.path()).unwrap());
        prefs.set_theme(Theme::Dark).unwrap();
        prefs.set_locale("ar").unwrap();

        let reloaded = Preferences::load(Storage::file(dir.path()).unwrap());
        assert_eq!(reloaded.theme(), Theme::Dark);
        assert_eq!(reloaded.locale(), "ar");
    }

    #[test]
    fn test_corrupt_values_load_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("theme.json"), "\"sepia\"").unwrap();
        std::fs::write(dir.path().join("locale.json"), "42").unwrap();

        let prefs = Preferences::load(Storage::file(dir.path()).unwrap());
        assert_eq!(prefs.theme(), Theme::Light);
        assert_eq!(prefs.locale(), "en");
    }

    #[test]
    fn test_theme_parsing() {
        assert_eq!(" Dark ".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.to_string(), "dark");
    }
}
