//! Locale data for URL localization.
//!
//! # Architecture
//!
//! - `catalog`: every locale the crate can describe, with display attributes
//! - `locale`: `Locale`, a catalog-validated locale handle
//! - `manager`: `LocaleProvider` trait and the default `LocaleManager`
//!
//! # Example
//!
//! ```rust,ignore
//! use route_localizer::i18n::{Locale, LocaleManager, LocaleProvider};
//!
//! let manager = LocaleManager::new("en", &["en".into(), "fr".into()], true)?;
//! let french = Locale::from_code("fr")?;
//! assert!(manager.is_supported(french.code()));
//! ```

mod catalog;
mod locale;
mod manager;

pub use catalog::{Direction, LocaleCatalog, LocaleConfig};
pub use locale::Locale;
pub use manager::{LocaleManager, LocaleProvider};
