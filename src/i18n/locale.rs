//! Locale type: a validated, catalog-backed locale.

use crate::error::{LocalizationError, Result};
use crate::i18n::catalog::{Direction, LocaleCatalog, LocaleConfig};

/// A locale that exists in the catalog.
///
/// Only constructible through [`Locale::from_code`], so every accessor can
/// read from the catalog without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    config: &'static LocaleConfig,
}

impl Locale {
    /// Create a Locale from a code string.
    ///
    /// # Returns
    /// * `Ok(Locale)` if the code is in the catalog
    /// * `Err(UnsupportedLocale)` otherwise
    pub fn from_code(code: &str) -> Result<Locale> {
        LocaleCatalog::get()
            .get_by_code(code)
            .map(|config| Locale { config })
            .ok_or_else(|| LocalizationError::UnsupportedLocale(code.to_string()))
    }

    pub fn code(&self) -> &'static str {
        self.config.code
    }

    /// English name (e.g., "French").
    pub fn name(&self) -> &'static str {
        self.config.name
    }

    /// Native name (e.g., "Français").
    pub fn native(&self) -> &'static str {
        self.config.native
    }

    pub fn script(&self) -> &'static str {
        self.config.script
    }

    pub fn direction(&self) -> Direction {
        self.config.direction
    }

    pub fn regional(&self) -> &'static str {
        self.config.regional
    }

    pub fn config(&self) -> &'static LocaleConfig {
        self.config
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_french() {
        let locale = Locale::from_code("fr").expect("Should succeed");
        assert_eq!(locale.code(), "fr");
        assert_eq!(locale.name(), "French");
        assert_eq!(locale.native(), "Français");
        assert_eq!(locale.script(), "Latn");
        assert_eq!(locale.regional(), "fr_FR");
    }

    #[test]
    fn test_from_code_invalid() {
        let result = Locale::from_code("xx");
        assert_eq!(
            result.unwrap_err(),
            LocalizationError::UnsupportedLocale("xx".to_string())
        );
    }

    #[test]
    fn test_from_code_empty() {
        assert!(Locale::from_code("").is_err());
    }

    #[test]
    fn test_locale_equality() {
        assert_eq!(Locale::from_code("en").unwrap(), Locale::from_code("en").unwrap());
        assert_ne!(Locale::from_code("en").unwrap(), Locale::from_code("fr").unwrap());
    }

    #[test]
    fn test_locale_display() {
        assert_eq!(Locale::from_code("pt-BR").unwrap().to_string(), "pt-BR");
    }

    #[test]
    fn test_rtl_direction() {
        assert_eq!(Locale::from_code("he").unwrap().direction(), Direction::Rtl);
    }
}
