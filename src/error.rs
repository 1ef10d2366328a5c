//! Error taxonomy for route localization.
//!
//! Only invalid input is an error. Outcomes like "this route has no template
//! for that locale" or "this path does not match any dynamic route" are
//! returned as `None` so the resolution chain can fall through.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocalizationError {
    /// The requested locale is not in the supported set.
    #[error("Locale '{0}' is not in the list of supported locales")]
    UnsupportedLocale(String),

    /// A dynamic route name has no descriptor in the registry.
    #[error("Route '{0}' is not a registered dynamic route")]
    RouteNotFound(String),

    /// A required dynamic-route parameter was not supplied.
    #[error("Invalid params: \"{parameter}\" for route: {route}")]
    MissingParameter { route: String, parameter: String },

    /// The route table could not be turned into a registry.
    #[error("Failed to build route registry: {0}")]
    RegistryBuild(String),

    /// Configuration values are inconsistent.
    #[error("Invalid localization config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LocalizationError>;
