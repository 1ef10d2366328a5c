use crate::routing::RouteDefinition;
use crate::slug::{ResolverBinding, SlugEntry};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prepended to every cache key
    pub key_prefix: String,

    /// Key body; `{hash}` is replaced by the request digest
    pub key_format: String,

    /// Whether the external store is consulted and written
    pub use_external: bool,

    /// TTL for external entries that depend on attributes
    pub external_ttl_secs: u64,

    /// Resolution kinds allowed in the external store
    /// (e.g. "translate_dynamic_shop_product")
    pub external_allowed_types: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "localization.".to_string(),
            key_format: "localized_url.{hash}".to_string(),
            use_external: false,
            external_ttl_secs: 3600,
            external_allowed_types: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Locales
    pub default_locale: String,
    pub supported_locales: Vec<String>,
    pub hide_default_locale_in_url: bool,

    // URLs
    /// Absolute application root; when unset, paths go through the
    /// `BaseUrlProvider`
    pub base_url: Option<String>,
    /// Path the application is mounted under (e.g. "/app")
    pub base_path: String,

    // Dynamic routes
    /// Route names treated as dynamic even when not flagged
    pub dynamic_route_names: Vec<String>,
    pub resolver_bindings: Vec<ResolverBinding>,

    // Cache
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            supported_locales: vec!["en".to_string()],
            hide_default_locale_in_url: true,
            base_url: None,
            base_path: String::new(),
            dynamic_route_names: Vec::new(),
            resolver_bindings: Vec::new(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a key lookup, falling back to defaults for
    /// anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let cache_defaults = CacheConfig::default();

        let config = Self {
            // Locales
            default_locale: lookup("LOCALIZATION_DEFAULT_LOCALE")
                .unwrap_or(defaults.default_locale),
            supported_locales: lookup("LOCALIZATION_SUPPORTED_LOCALES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.supported_locales),
            hide_default_locale_in_url: parse_bool(
                lookup("LOCALIZATION_HIDE_DEFAULT_LOCALE"),
                defaults.hide_default_locale_in_url,
            )
            .context("LOCALIZATION_HIDE_DEFAULT_LOCALE must be a boolean")?,

            // URLs
            base_url: lookup("LOCALIZATION_BASE_URL").filter(|v| !v.is_empty()),
            base_path: lookup("LOCALIZATION_BASE_PATH").unwrap_or_default(),

            // Dynamic routes
            dynamic_route_names: lookup("LOCALIZATION_DYNAMIC_ROUTES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            resolver_bindings: match lookup("LOCALIZATION_RESOLVER_BINDINGS") {
                Some(v) => parse_bindings(&v).context("Invalid LOCALIZATION_RESOLVER_BINDINGS")?,
                None => Vec::new(),
            },

            // Cache
            cache: CacheConfig {
                key_prefix: lookup("LOCALIZATION_CACHE_PREFIX")
                    .unwrap_or(cache_defaults.key_prefix),
                key_format: lookup("LOCALIZATION_CACHE_KEY_FORMAT")
                    .unwrap_or(cache_defaults.key_format),
                use_external: parse_bool(
                    lookup("LOCALIZATION_EXTERNAL_CACHE"),
                    cache_defaults.use_external,
                )
                .context("LOCALIZATION_EXTERNAL_CACHE must be a boolean")?,
                external_ttl_secs: match lookup("LOCALIZATION_EXTERNAL_CACHE_TTL") {
                    Some(v) => v
                        .trim()
                        .parse()
                        .context("LOCALIZATION_EXTERNAL_CACHE_TTL must be a number of seconds")?,
                    None => cache_defaults.external_ttl_secs,
                },
                external_allowed_types: lookup("LOCALIZATION_EXTERNAL_CACHE_TYPES")
                    .map(|v| split_list(&v))
                    .unwrap_or_default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).context("Failed to parse localization config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.supported_locales.is_empty() {
            bail!("At least one supported locale is required");
        }
        if !self.supported_locales.contains(&self.default_locale) {
            bail!(
                "Default locale '{}' is not in the supported locales {:?}",
                self.default_locale,
                self.supported_locales
            );
        }
        if !self.cache.key_format.contains("{hash}") {
            bail!("Cache key format must contain {{hash}}");
        }
        Ok(())
    }
}

/// A complete route table: config, application routes, and slug tables for
/// in-memory resolvers keyed by resolver id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTableFile {
    pub config: Config,
    pub routes: Vec<RouteDefinition>,
    pub slugs: BTreeMap<String, Vec<SlugEntry>>,
}

impl RouteTableFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read route table at {}", path.display()))?;
        let table: RouteTableFile = serde_json::from_str(&raw)
            .context(format!("Failed to parse route table at {}", path.display()))?;
        table.config.validate()?;
        Ok(table)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => bail!("'{}' is not a boolean", other),
    }
}

/// Parse `resolver=param,param;resolver=param`.
fn parse_bindings(value: &str) -> Result<Vec<ResolverBinding>> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|binding| -> Result<ResolverBinding> {
            let (resolver, params) = binding
                .split_once('=')
                .context(format!("Binding '{}' is missing '='", binding))?;
            let params = split_list(params);
            if resolver.trim().is_empty() || params.is_empty() {
                bail!("Binding '{}' needs a resolver and at least one parameter", binding);
            }
            Ok(ResolverBinding {
                resolver: resolver.trim().to_string(),
                params,
            })
        })
        .collect()
}
