//! Locale provider: which locales are supported, which is the default, and
//! which one the current request is using.

use crate::error::{LocalizationError, Result};
use crate::i18n::Locale;
use parking_lot::RwLock;
use tracing::debug;

/// Source of locale state for the localization engine.
///
/// Locale negotiation (cookies, headers, sessions) happens outside this
/// crate; the provider only reports its outcome.
pub trait LocaleProvider: Send + Sync {
    fn default_locale(&self) -> Locale;

    /// Supported locales, in configuration order.
    fn supported_locales(&self) -> Vec<Locale>;

    fn current_locale(&self) -> Locale;

    fn is_supported(&self, code: &str) -> bool {
        self.supported_locales().iter().any(|l| l.code() == code)
    }

    fn is_default_locale_hidden_in_url(&self) -> bool;

    fn set_supported_locales(&self, codes: &[String]) -> Result<()>;

    /// Switch the current locale; returns the locale actually in effect.
    fn set_current_locale(&self, code: Option<&str>) -> Locale;
}

struct LocaleState {
    default: Locale,
    supported: Vec<Locale>,
    current: Locale,
}

/// Default [`LocaleProvider`] backed by the locale catalog.
pub struct LocaleManager {
    state: RwLock<LocaleState>,
    hide_default_in_url: bool,
}

impl LocaleManager {
    /// Create a manager with the given default and supported locales.
    ///
    /// The default locale must be one of the supported locales. The current
    /// locale starts out as the default.
    pub fn new(default: &str, supported: &[String], hide_default_in_url: bool) -> Result<Self> {
        let supported = resolve_codes(supported)?;
        let default = Locale::from_code(default)?;
        if !supported.contains(&default) {
            return Err(LocalizationError::Config(format!(
                "default locale '{}' is not a supported locale",
                default
            )));
        }

        Ok(Self {
            state: RwLock::new(LocaleState {
                default,
                supported,
                current: default,
            }),
            hide_default_in_url,
        })
    }
}

impl LocaleProvider for LocaleManager {
    fn default_locale(&self) -> Locale {
        self.state.read().default
    }

    fn supported_locales(&self) -> Vec<Locale> {
        self.state.read().supported.clone()
    }

    fn current_locale(&self) -> Locale {
        self.state.read().current
    }

    fn is_default_locale_hidden_in_url(&self) -> bool {
        self.hide_default_in_url
    }

    fn set_supported_locales(&self, codes: &[String]) -> Result<()> {
        let supported = resolve_codes(codes)?;
        let mut state = self.state.write();
        if !supported.contains(&state.default) {
            return Err(LocalizationError::Config(format!(
                "default locale '{}' is not a supported locale",
                state.default
            )));
        }
        if !supported.contains(&state.current) {
            let default = state.default;
            state.current = default;
        }
        state.supported = supported;
        Ok(())
    }

    fn set_current_locale(&self, code: Option<&str>) -> Locale {
        let mut state = self.state.write();
        let next = code
            .and_then(|code| state.supported.iter().find(|l| l.code() == code).copied())
            .unwrap_or(state.default);
        debug!("Current locale set to {}", next);
        state.current = next;
        next
    }
}

fn resolve_codes(codes: &[String]) -> Result<Vec<Locale>> {
    if codes.is_empty() {
        return Err(LocalizationError::Config(
            "at least one supported locale is required".to_string(),
        ));
    }

    let mut locales: Vec<Locale> = Vec::with_capacity(codes.len());
    for code in codes {
        let locale = Locale::from_code(code.trim())?;
        if !locales.contains(&locale) {
            locales.push(locale);
        }
    }
    Ok(locales)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_new_starts_on_default_locale() {
        let manager = LocaleManager::new("en", &codes(&["en", "fr"]), true).unwrap();
        assert_eq!(manager.current_locale().code(), "en");
        assert_eq!(manager.default_locale().code(), "en");
        assert!(manager.is_default_locale_hidden_in_url());
    }

    #[test]
    fn test_new_rejects_default_outside_supported() {
        let result = LocaleManager::new("de", &codes(&["en", "fr"]), true);
        assert!(matches!(result, Err(LocalizationError::Config(_))));
    }

    #[test]
    fn test_new_rejects_unknown_code() {
        let result = LocaleManager::new("en", &codes(&["en", "xx"]), true);
        assert_eq!(
            result.err(),
            Some(LocalizationError::UnsupportedLocale("xx".to_string()))
        );
    }

    #[test]
    fn test_supported_locales_keep_order_and_dedup() {
        let manager = LocaleManager::new("en", &codes(&["fr", "en", "fr"]), false).unwrap();
        let keys: Vec<_> = manager.supported_locales().iter().map(|l| l.code()).collect();
        assert_eq!(keys, vec!["fr", "en"]);
    }

    #[test]
    fn test_is_supported() {
        let manager = LocaleManager::new("en", &codes(&["en", "fr"]), false).unwrap();
        assert!(manager.is_supported("fr"));
        assert!(!manager.is_supported("de"));
    }

    #[test]
    fn test_set_current_locale_falls_back_to_default() {
        let manager = LocaleManager::new("en", &codes(&["en", "fr"]), false).unwrap();
        assert_eq!(manager.set_current_locale(Some("fr")).code(), "fr");
        assert_eq!(manager.set_current_locale(Some("de")).code(), "en");
        assert_eq!(manager.set_current_locale(None).code(), "en");
    }

    #[test]
    fn test_set_supported_locales_resets_current_when_dropped() {
        let manager = LocaleManager::new("en", &codes(&["en", "fr", "de"]), false).unwrap();
        manager.set_current_locale(Some("de"));
        manager.set_supported_locales(&codes(&["en", "fr"])).unwrap();
        assert_eq!(manager.current_locale().code(), "en");
        assert!(!manager.is_supported("de"));
    }

    #[test]
    fn test_set_supported_locales_must_keep_default() {
        let manager = LocaleManager::new("en", &codes(&["en", "fr"]), false).unwrap();
        assert!(manager.set_supported_locales(&codes(&["fr"])).is_err());
        assert!(manager.is_supported("en"));
    }
}
