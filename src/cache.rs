//! Two-tier cache for resolved URLs.
//!
//! The local tier is an in-process map that lives as long as the cache
//! (no eviction). The external tier is an optional shared store. Entries
//! reach the external tier only when the source URL had no query string and
//! the resolution kind is in the configured allow-list.

use crate::config::CacheConfig;
use crate::metrics::CacheMetrics;
use crate::routing::Attributes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Shared cache store, e.g. Redis or memcached behind an adapter.
///
/// Unavailability is the store's concern: a store that cannot be reached
/// should behave as a miss on `get` and a no-op on `put`.
pub trait ExternalCacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value; `ttl` of `None` keeps it forever.
    fn put(&self, key: &str, value: &str, ttl: Option<Duration>);

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Which branch of the resolution chain produced a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionKind {
    CurrentRoute(String),
    Dynamic(String),
    Static(String),
    Fallback,
}

impl ResolutionKind {
    /// Name matched against the external-cache allow-list.
    ///
    /// Dots in route names become underscores, so `shop.product` resolved
    /// dynamically is `translate_dynamic_shop_product`.
    pub fn type_name(&self) -> String {
        let raw = match self {
            ResolutionKind::CurrentRoute(route) => format!("translate_current_{}", route),
            ResolutionKind::Dynamic(route) => format!("translate_dynamic_{}", route),
            ResolutionKind::Static(route) => format!("translate_static_{}", route),
            ResolutionKind::Fallback => "translate_fallback".to_string(),
        };
        raw.replace('.', "_")
    }
}

/// Normalized inputs of one resolution, hashed into the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheKeyInput<'a> {
    /// Resolved target locale; `None` strips the locale
    pub target: Option<&'a str>,
    pub source: &'a str,
    pub url: &'a str,
    /// Current route name when the URL came from the request context
    pub route: Option<&'a str>,
    /// Current route parameters, set together with `route`
    pub route_parameters: Option<&'a Attributes>,
    pub attributes: &'a Attributes,
    pub show_hidden_locale: bool,
    pub slugs_resolved: bool,
    /// Configured base URL that relative results are composed with
    pub base_url: Option<&'a str>,
}

impl CacheKeyInput<'_> {
    /// SHA-256 hex digest of the JSON encoding.
    fn digest(&self) -> String {
        let encoded = serde_json::to_vec(self).unwrap_or_else(|e| {
            warn!("Cache key input did not serialize: {}", e);
            format!("{:?}", self).into_bytes()
        });
        format!("{:x}", Sha256::digest(&encoded))
    }
}

pub struct RouteCache {
    config: CacheConfig,
    local: DashMap<String, String>,
    external: Option<Arc<dyn ExternalCacheStore>>,
    metrics: CacheMetrics,
}

impl RouteCache {
    pub fn new(config: CacheConfig, external: Option<Arc<dyn ExternalCacheStore>>) -> Self {
        Self {
            config,
            local: DashMap::new(),
            external,
            metrics: CacheMetrics::new(),
        }
    }

    /// Deterministic key for a normalized request.
    pub fn key(&self, input: &CacheKeyInput<'_>) -> String {
        format!(
            "{}{}",
            self.config.key_prefix,
            self.config.key_format.replace("{hash}", &input.digest())
        )
    }

    /// Look up a key: local tier first, then the external store if enabled.
    /// External hits are copied into the local tier.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.local.get(key) {
            self.metrics.record_local_hit();
            return Some(value.clone());
        }

        if let Some(store) = self.external_store() {
            if let Some(value) = store.get(key) {
                debug!("External cache hit for {}", key);
                self.local.insert(key.to_string(), value.clone());
                self.metrics.record_external_hit();
                return Some(value);
            }
        }

        self.metrics.record_miss();
        None
    }

    /// Store a resolved URL.
    ///
    /// Always written locally. Written externally only when external caching
    /// is enabled, the source URL had no query string, and `kind` is in the
    /// allow-list. `forever` entries get no TTL.
    pub fn put(&self, key: &str, value: &str, kind: &ResolutionKind, has_query: bool, forever: bool) {
        self.local.insert(key.to_string(), value.to_string());

        let type_name = kind.type_name();
        let Some(store) = self.external_store() else {
            return;
        };
        if !self.is_save_to_external(has_query, &type_name) {
            debug!("Not caching {} externally ({})", key, type_name);
            self.metrics.record_external_skip();
            return;
        }

        let ttl = if forever {
            None
        } else {
            Some(Duration::from_secs(self.config.external_ttl_secs))
        };
        store.put(key, value, ttl);
        self.metrics.record_external_write();
    }

    pub fn is_save_to_external(&self, has_query: bool, type_name: &str) -> bool {
        self.external_store().is_some()
            && !has_query
            && self.config.external_allowed_types.iter().any(|t| t == type_name)
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    pub fn clear_local(&self) {
        self.local.clear();
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn external_store(&self) -> Option<&dyn ExternalCacheStore> {
        if !self.config.use_external {
            return None;
        }
        self.external.as_deref()
    }
}

/// In-memory [`ExternalCacheStore`] with per-entry expiry.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, (String, Option<DateTime<Utc>>)>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expiry time of a stored entry; `Some(None)` means it never expires.
    pub fn expires_at(&self, key: &str) -> Option<Option<DateTime<Utc>>> {
        self.entries.get(key).map(|entry| entry.1)
    }
}

impl ExternalCacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) => match entry.1 {
                Some(expires_at) if expires_at <= Utc::now() => true,
                _ => return Some(entry.0.clone()),
            },
            None => return None,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| Utc::now() + ttl);
        self.entries
            .insert(key.to_string(), (value.to_string(), expires_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(use_external: bool, allowed: &[&str]) -> CacheConfig {
        CacheConfig {
            key_prefix: "localization.".to_string(),
            key_format: "url.{hash}".to_string(),
            use_external,
            external_ttl_secs: 600,
            external_allowed_types: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn input<'a>(url: &'a str, attributes: &'a Attributes) -> CacheKeyInput<'a> {
        CacheKeyInput {
            target: Some("fr"),
            source: "en",
            url,
            route: None,
            route_parameters: None,
            attributes,
            show_hidden_locale: false,
            slugs_resolved: false,
            base_url: None,
        }
    }

    // ==================== Key Tests ====================

    #[test]
    fn test_key_is_deterministic_and_formatted() {
        let cache = RouteCache::new(config(false, &[]), None);
        let attributes = Attributes::new();
        let first = cache.key(&input("/about", &attributes));
        let second = cache.key(&input("/about", &attributes));

        assert_eq!(first, second);
        assert!(first.starts_with("localization.url."));
        assert_eq!(first.len(), "localization.url.".len() + 64);
    }

    #[test]
    fn test_key_changes_with_any_field() {
        let cache = RouteCache::new(config(false, &[]), None);
        let empty = Attributes::new();
        let with_id = Attributes::from([("id".to_string(), "1".to_string())]);
        let base = input("/about", &empty);

        let variants = [
            CacheKeyInput { target: Some("de"), ..base.clone() },
            CacheKeyInput { target: None, ..base.clone() },
            CacheKeyInput { source: "fr", ..base.clone() },
            CacheKeyInput { url: "/contact", ..base.clone() },
            CacheKeyInput { route: Some("about"), ..base.clone() },
            CacheKeyInput { route_parameters: Some(&with_id), ..base.clone() },
            CacheKeyInput { attributes: &with_id, ..base.clone() },
            CacheKeyInput { show_hidden_locale: true, ..base.clone() },
            CacheKeyInput { slugs_resolved: true, ..base.clone() },
            CacheKeyInput { base_url: Some("https://shop.example/"), ..base.clone() },
        ];
        let base_key = cache.key(&base);
        for variant in &variants {
            assert_ne!(cache.key(variant), base_key, "{:?}", variant);
        }
    }

    #[test]
    fn test_key_fields_do_not_run_together() {
        let cache = RouteCache::new(config(false, &[]), None);
        let empty = Attributes::new();
        let a = CacheKeyInput { source: "en", url: "/x", ..input("", &empty) };
        let b = CacheKeyInput { source: "en/", url: "x", ..input("", &empty) };
        assert_ne!(cache.key(&a), cache.key(&b));
    }

    #[test]
    fn test_key_hashes_json_encoding() {
        let cache = RouteCache::new(config(false, &[]), None);
        let attributes = Attributes::from([("id".to_string(), "1".to_string())]);
        let request = input("/about", &attributes);

        let json = serde_json::to_vec(&request).unwrap();
        let expected = format!("localization.url.{:x}", Sha256::digest(&json));
        assert_eq!(cache.key(&request), expected);
    }

    // ==================== Tier Tests ====================

    #[test]
    fn test_put_then_get_local() {
        let cache = RouteCache::new(config(false, &[]), None);
        assert_eq!(cache.get("k"), None);
        cache.put("k", "/fr/a-propos", &ResolutionKind::Fallback, false, true);
        assert_eq!(cache.get("k").as_deref(), Some("/fr/a-propos"));
        assert_eq!(cache.metrics().local_hits(), 1);
        assert_eq!(cache.metrics().misses(), 1);
    }

    #[test]
    fn test_external_hit_is_copied_locally() {
        let store = Arc::new(MemoryCacheStore::new());
        store.put("k", "/fr/boutique", None);
        let cache = RouteCache::new(config(true, &[]), Some(store.clone()));

        assert_eq!(cache.get("k").as_deref(), Some("/fr/boutique"));
        assert_eq!(cache.local_len(), 1);
        assert_eq!(cache.metrics().external_hits(), 1);
    }

    #[test]
    fn test_external_disabled_is_never_read() {
        let store = Arc::new(MemoryCacheStore::new());
        store.put("k", "/fr/boutique", None);
        let cache = RouteCache::new(config(false, &[]), Some(store));

        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_query_string_is_never_written_externally() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = RouteCache::new(config(true, &["translate_fallback"]), Some(store.clone()));

        cache.put("k", "/fr/shop?ref=42", &ResolutionKind::Fallback, true, false);

        assert!(store.is_empty());
        assert_eq!(cache.local_len(), 1);
        assert_eq!(cache.metrics().external_skips(), 1);
    }

    #[test]
    fn test_kind_outside_allow_list_is_local_only() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = RouteCache::new(
            config(true, &["translate_dynamic_shop_category"]),
            Some(store.clone()),
        );

        cache.put("k", "/fr/p/chaise", &ResolutionKind::Dynamic("shop.product".to_string()), false, false);
        assert!(store.is_empty());

        cache.put("c", "/fr/chaises", &ResolutionKind::Dynamic("shop.category".to_string()), false, false);
        assert!(store.has("c"));
        assert_eq!(cache.local_len(), 2);
    }

    #[test]
    fn test_forever_entries_have_no_expiry() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = RouteCache::new(config(true, &["translate_fallback"]), Some(store.clone()));

        cache.put("forever", "/fr", &ResolutionKind::Fallback, false, true);
        cache.put("ttl", "/fr/x", &ResolutionKind::Fallback, false, false);

        assert_eq!(store.expires_at("forever"), Some(None));
        assert!(matches!(store.expires_at("ttl"), Some(Some(_))));
    }

    // ==================== Kind Tests ====================

    #[test]
    fn test_type_name_replaces_dots() {
        assert_eq!(
            ResolutionKind::Dynamic("shop.product".to_string()).type_name(),
            "translate_dynamic_shop_product"
        );
        assert_eq!(
            ResolutionKind::Static("about".to_string()).type_name(),
            "translate_static_about"
        );
        assert_eq!(
            ResolutionKind::CurrentRoute("home".to_string()).type_name(),
            "translate_current_home"
        );
        assert_eq!(ResolutionKind::Fallback.type_name(), "translate_fallback");
    }

    // ==================== Memory Store Tests ====================

    #[test]
    fn test_memory_store_expired_entry_is_removed() {
        let store = MemoryCacheStore::new();
        store.put("k", "v", Some(Duration::ZERO));
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }
}
