use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use super::collection::PersistentCollection;
use super::store::{DurableStore, THEME_KEY};
use crate::error::PersistenceError;

/// Display theme chosen by the user
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    /// Follow the host color scheme, resolved at read time
    #[default]
    System,
}

/// Concrete scheme the front end renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ThemePreference {
    /// Next value of the Light -> Dark -> System -> Light cycle
    pub fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
            Self::System => Self::Light,
        }
    }

    pub fn resolve_effective(self, system_scheme: ColorScheme) -> ColorScheme {
        match self {
            Self::Light => ColorScheme::Light,
            Self::Dark => ColorScheme::Dark,
            Self::System => system_scheme,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

impl ColorScheme {
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown color scheme '{}'", other)),
        }
    }
}

/// Persisted theme preference, defaulting to [`ThemePreference::System`]
#[derive(Debug)]
pub struct ThemeSettings {
    preference: PersistentCollection<ThemePreference>,
}

impl ThemeSettings {
    pub fn new(store: Rc<dyn DurableStore>) -> Self {
        Self {
            preference: PersistentCollection::new(store, THEME_KEY),
        }
    }

    pub async fn current(&self) -> ThemePreference {
        self.preference.get().await
    }

    /// Advance to the next theme in the cycle and persist it.
    ///
    /// On a failed write the preference stays where it was.
    pub async fn toggle(&self) -> Result<ThemePreference, PersistenceError> {
        let mut applied = ThemePreference::default();
        self.preference
            .update(|pref| {
                *pref = pref.next();
                applied = *pref;
                true
            })
            .await?;
        tracing::info!(theme = %applied, "Theme changed");
        Ok(applied)
    }

    pub async fn set(&self, theme: ThemePreference) -> Result<(), PersistenceError> {
        self.preference
            .update(|pref| {
                let changed = *pref != theme;
                *pref = theme;
                changed
            })
            .await?;
        Ok(())
    }

    /// Scheme to render with, given the host's current scheme
    pub async fn effective(&self, system_scheme: ColorScheme) -> ColorScheme {
        self.current().await.resolve_effective(system_scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::store::testing::FlakyStore;
    use crate::state::store::MemoryStore;

    #[test]
    fn test_cycle_closes_after_three_steps() {
        let start = ThemePreference::Light;
        assert_eq!(start.next(), ThemePreference::Dark);
        assert_eq!(start.next().next(), ThemePreference::System);
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn test_resolve_effective() {
        use ColorScheme as C;
        assert_eq!(ThemePreference::Light.resolve_effective(C::Dark), C::Light);
        assert_eq!(ThemePreference::Dark.resolve_effective(C::Light), C::Dark);
        assert_eq!(ThemePreference::System.resolve_effective(C::Dark), C::Dark);
        assert_eq!(ThemePreference::System.resolve_effective(C::Light), C::Light);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Dark".parse::<ThemePreference>(), Ok(ThemePreference::Dark));
        assert!("sepia".parse::<ThemePreference>().is_err());
        assert_eq!(ThemePreference::System.to_string(), "system");
    }

    #[tokio::test]
    async fn test_defaults_to_system() {
        let theme = ThemeSettings::new(Rc::new(MemoryStore::new()));
        assert_eq!(theme.current().await, ThemePreference::System);
    }

    #[tokio::test]
    async fn test_three_toggles_from_light_return_to_light() {
        let store = MemoryStore::new();
        let theme = ThemeSettings::new(Rc::new(store.clone()));
        theme.set(ThemePreference::Light).await.unwrap();

        assert_eq!(theme.toggle().await.unwrap(), ThemePreference::Dark);
        assert_eq!(theme.toggle().await.unwrap(), ThemePreference::System);
        assert_eq!(theme.toggle().await.unwrap(), ThemePreference::Light);
        assert_eq!(store.raw(THEME_KEY), Some("\"light\"".to_string()));
    }

    #[tokio::test]
    async fn test_failed_toggle_keeps_current() {
        let store = FlakyStore::new();
        let theme = ThemeSettings::new(Rc::new(store.clone()));
        theme.set(ThemePreference::Dark).await.unwrap();

        store.fail_writes(true);
        assert!(theme.toggle().await.is_err());
        assert_eq!(theme.current().await, ThemePreference::Dark);
    }

    #[tokio::test]
    async fn test_preference_survives_restart() {
        let store = MemoryStore::new();
        ThemeSettings::new(Rc::new(store.clone()))
            .set(ThemePreference::Dark)
            .await
            .unwrap();

        let reopened = ThemeSettings::new(Rc::new(store));
        assert_eq!(reopened.current().await, ThemePreference::Dark);
        assert_eq!(reopened.effective(ColorScheme::Light).await, ColorScheme::Dark);
    }
}
