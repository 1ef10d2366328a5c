//! Locale catalog: every locale this crate knows how to describe.
//!
//! Supported locales are chosen from this catalog by code. The catalog is
//! immutable data, so it is initialized once with `OnceLock` and shared.

use std::sync::OnceLock;

/// Text direction of a locale's script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// Display attributes for a locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleConfig {
    /// Locale code as it appears in URLs (e.g., "en", "fr", "pt-BR")
    pub code: &'static str,

    /// English name (e.g., "French")
    pub name: &'static str,

    /// Native name (e.g., "Français")
    pub native: &'static str,

    /// ISO 15924 script code (e.g., "Latn", "Arab")
    pub script: &'static str,

    pub direction: Direction,

    /// POSIX-style regional code (e.g., "fr_FR")
    pub regional: &'static str,
}

pub struct LocaleCatalog {
    locales: Vec<LocaleConfig>,
}

static CATALOG: OnceLock<LocaleCatalog> = OnceLock::new();

impl LocaleCatalog {
    /// Get the shared catalog instance.
    pub fn get() -> &'static LocaleCatalog {
        CATALOG.get_or_init(|| LocaleCatalog {
            locales: known_locales(),
        })
    }

    /// Get a locale configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// Get all known locales, in catalog order.
    pub fn list_all(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

fn known_locales() -> Vec<LocaleConfig> {
    use Direction::{Ltr, Rtl};

    let entry = |code, name, native, script, direction, regional| LocaleConfig {
        code,
        name,
        native,
        script,
        direction,
        regional,
    };

    vec![
        entry("en", "English", "English", "Latn", Ltr, "en_GB"),
        entry("en-US", "American English", "American English", "Latn", Ltr, "en_US"),
        entry("fr", "French", "Français", "Latn", Ltr, "fr_FR"),
        entry("de", "German", "Deutsch", "Latn", Ltr, "de_DE"),
        entry("es", "Spanish", "Español", "Latn", Ltr, "es_ES"),
        entry("it", "Italian", "Italiano", "Latn", Ltr, "it_IT"),
        entry("pt", "Portuguese", "Português", "Latn", Ltr, "pt_PT"),
        entry("pt-BR", "Brazilian Portuguese", "Português do Brasil", "Latn", Ltr, "pt_BR"),
        entry("nl", "Dutch", "Nederlands", "Latn", Ltr, "nl_NL"),
        entry("pl", "Polish", "Polski", "Latn", Ltr, "pl_PL"),
        entry("ru", "Russian", "Русский", "Cyrl", Ltr, "ru_RU"),
        entry("uk", "Ukrainian", "Українська", "Cyrl", Ltr, "uk_UA"),
        entry("tr", "Turkish", "Türkçe", "Latn", Ltr, "tr_TR"),
        entry("ar", "Arabic", "العربية", "Arab", Rtl, "ar_AE"),
        entry("he", "Hebrew", "עברית", "Hebr", Rtl, "he_IL"),
        entry("fa", "Persian", "فارسی", "Arab", Rtl, "fa_IR"),
        entry("ja", "Japanese", "日本語", "Jpan", Ltr, "ja_JP"),
        entry("zh", "Chinese (Simplified)", "简体中文", "Hans", Ltr, "zh_CN"),
        entry("ko", "Korean", "한국어", "Hang", Ltr, "ko_KR"),
    ]
}
