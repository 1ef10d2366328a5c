//! Integration tests for route localization
//!
//! These tests drive the public engine API end to end: route table loading,
//! the resolution chain, and the two cache tiers.

use proptest::prelude::*;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

use route_localizer::{
    Attributes, Config, Localization, LocalizationError, LocalizedUrlRequest, MemoryCacheStore,
    RequestRouteContext, ResolverBinding, RouteDefinition, RouteTableFile, StaticSlugResolver,
};

// ==================== Test Helpers ====================

fn test_config() -> Config {
    Config {
        default_locale: "en".to_string(),
        supported_locales: vec!["en".to_string(), "fr".to_string(), "de".to_string()],
        hide_default_locale_in_url: true,
        resolver_bindings: vec![
            ResolverBinding::new("catalog", &["category", "product"]),
            ResolverBinding::new("docs", &["id", "slug"]),
            ResolverBinding::new("press", &["section", "article", "page"]),
        ],
        ..Config::default()
    }
}

fn test_routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new("about", "/about")
            .with_translation("en", "/about")
            .with_translation("fr", "/a-propos")
            .with_translation("de", "/ueber-uns"),
        RouteDefinition::new("shop.product", "/shop/{category}/{product}").make_dynamic(),
        RouteDefinition::new("doc", "/doc/{id}").make_dynamic(),
        RouteDefinition::new("item", "/item/{id}/{slug}").make_dynamic(),
        RouteDefinition::new("press.article", "/{section}/{article}/{page}").make_dynamic(),
    ]
}

fn catalog() -> Arc<StaticSlugResolver> {
    let mut resolver = StaticSlugResolver::default();
    resolver
        .insert("category", 3, &[("en", "lamps"), ("fr", "lampes"), ("de", "lampen")])
        .insert("product", 30, &[("en", "desk-lamp"), ("fr", "lampe-de-bureau"), ("de", "schreibtischlampe")]);
    Arc::new(resolver)
}

fn docs() -> Arc<StaticSlugResolver> {
    let mut resolver = StaticSlugResolver::default();
    resolver.insert("id", 42, &[("en", "widget"), ("fr", "gadget")]);
    Arc::new(resolver)
}

fn press() -> Arc<StaticSlugResolver> {
    let mut resolver = StaticSlugResolver::default();
    resolver
        .insert("section", 1, &[("en", "news"), ("fr", "actualites")])
        .insert("article", 2, &[("en", "launch"), ("fr", "lancement")])
        .insert("page", 3, &[("en", "details"), ("fr", "details")]);
    Arc::new(resolver)
}

fn engine_with(config: Config, store: Option<Arc<MemoryCacheStore>>) -> Localization {
    let mut builder = Localization::builder(config)
        .routes(test_routes())
        .slug_resolver("catalog", catalog())
        .slug_resolver("docs", docs())
        .slug_resolver("press", press());
    if let Some(store) = store {
        builder = builder.external_cache(store);
    }
    builder.build().expect("Failed to build engine")
}

fn engine() -> Localization {
    engine_with(test_config(), None)
}

fn external_config(allowed: &[&str]) -> Config {
    let mut config = test_config();
    config.cache.use_external = true;
    config.cache.external_allowed_types = allowed.iter().map(|t| t.to_string()).collect();
    config
}

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ==================== Route Table Loading ====================

#[test]
fn test_engine_from_route_table_file() {
    let json = r#"{
        "config": {
            "default_locale": "en",
            "supported_locales": ["en", "fr"],
            "resolver_bindings": [{"resolver": "catalog", "params": ["category"]}]
        },
        "routes": [
            {"name": "about", "uri": "/about", "translations": {"en": "/about", "fr": "/a-propos"}},
            {"name": "shop.category", "uri": "/shop/{category}", "dynamic": true}
        ],
        "slugs": {
            "catalog": [
                {"param": "category", "id": 5, "slugs": {"en": "sofas", "fr": "canapes"}}
            ]
        }
    }"#;
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(json.as_bytes()).expect("Failed to write route table");

    let table = RouteTableFile::load(file.path()).expect("Failed to load route table");
    let mut builder = Localization::builder(table.config).routes(table.routes);
    for (resolver, entries) in table.slugs {
        builder = builder.slug_resolver(&resolver, Arc::new(StaticSlugResolver::new(entries)));
    }
    let engine = builder.build().expect("Failed to build engine");

    assert!(engine.validate().unwrap().is_clean());
    assert_eq!(engine.localize_url(Some("/shop/sofas"), Some("fr")).unwrap(), "/fr/shop/canapes");
    assert_eq!(engine.localize_url(Some("/about"), Some("fr")).unwrap(), "/fr/a-propos");
}

// ==================== Locale Handling ====================

#[test]
fn test_default_locale_hidden() {
    let engine = engine();

    assert_eq!(engine.localize_url(Some("/contact"), Some("en")).unwrap(), "/contact");
    assert_eq!(engine.localize_url(Some("/contact"), Some("fr")).unwrap(), "/fr/contact");
}

#[test]
fn test_default_locale_visible_when_not_hidden() {
    let config = Config {
        hide_default_locale_in_url: false,
        ..test_config()
    };
    let engine = engine_with(config, None);

    assert_eq!(engine.localize_url(Some("/contact"), Some("en")).unwrap(), "/en/contact");
}

#[test]
fn test_unsupported_locale_rejected() {
    let engine = engine();

    let err = engine.localize_url(Some("/about"), Some("xx")).unwrap_err();
    assert_eq!(err, LocalizationError::UnsupportedLocale("xx".to_string()));
    assert!(err.to_string().contains("'xx'"));
}

#[test]
fn test_unlocalized_never_validated() {
    let engine = engine();

    assert_eq!(engine.get_non_localized_url(Some("/fr/a-propos")).unwrap(), "/a-propos");
    assert_eq!(engine.get_non_localized_url(Some("/ja/contact")).unwrap(), "/ja/contact");
}

// ==================== Dynamic Routes ====================

#[test]
fn test_round_trip_through_slugs() {
    let engine = engine();

    let url = engine
        .get_url_from_route_name("fr", "doc", &attrs(&[("id", "42")]), false, false)
        .unwrap()
        .unwrap();
    assert_eq!(url, "/fr/doc/gadget");
    assert_eq!(engine.route_name_from_path(&url, "fr").unwrap().as_deref(), Some("doc"));

    let english = engine
        .get_localized_url(&LocalizedUrlRequest::to("en").with_url(&url).from_locale("fr"))
        .unwrap();
    assert_eq!(english, "/doc/widget");
}

#[test]
fn test_switching_locale_of_current_dynamic_page() {
    let context = Arc::new(RequestRouteContext::new());
    context.set_current_route(
        Some("shop.product"),
        attrs(&[("category", "3"), ("product", "30")]),
    );
    context.set_full_url(Some("http://localhost/shop/lamps/desk-lamp"));

    let engine = Localization::builder(test_config())
        .routes(test_routes())
        .slug_resolver("catalog", catalog())
        .route_context(context)
        .build()
        .unwrap();

    assert_eq!(
        engine.localize_url(None, Some("de")).unwrap(),
        "/de/shop/lampen/schreibtischlampe"
    );
}

#[test]
fn test_missing_parameter_named() {
    let engine = engine();

    let err = engine
        .get_localized_url(&LocalizedUrlRequest::to("fr").with_url("item").with_attribute("id", "1"))
        .unwrap_err();
    assert_eq!(
        err,
        LocalizationError::MissingParameter {
            route: "item".to_string(),
            parameter: "slug".to_string(),
        }
    );
    assert_eq!(err.to_string(), "Invalid params: \"slug\" for route: item");
}

#[test]
fn test_unknown_route_name_is_plain_url() {
    let engine = engine();

    // Not a registered route, so it is treated as a path.
    assert_eq!(engine.localize_url(Some("missing.route"), Some("fr")).unwrap(), "/fr/missing.route");
}

#[test]
fn test_partial_reverse_match_rejected() {
    let engine = engine();

    // Section and article resolve, the third segment does not.
    let url = engine
        .get_localized_url(&LocalizedUrlRequest::to("fr").with_url("/news/launch/unknown"))
        .unwrap();
    assert_eq!(url, "/fr/news/launch/unknown");

    let full = engine
        .get_localized_url(&LocalizedUrlRequest::to("fr").with_url("/news/launch/details"))
        .unwrap();
    assert_eq!(full, "/fr/actualites/lancement/details");
}

#[test]
fn test_slugs_already_resolved() {
    let engine = engine();

    let url = engine
        .get_localized_url(
            &LocalizedUrlRequest::to("fr")
                .with_url("shop.product")
                .with_attributes(attrs(&[("category", "lampes"), ("product", "lampe-de-bureau")]))
                .slugs_resolved(),
        )
        .unwrap();
    assert_eq!(url, "/fr/shop/lampes/lampe-de-bureau");
}

// ==================== Cache Policy ====================

#[test]
fn test_query_string_never_cached_externally() {
    let store = Arc::new(MemoryCacheStore::new());
    let engine = engine_with(external_config(&["translate_fallback"]), Some(store.clone()));

    let first = engine.localize_url(Some("/shop?ref=42"), Some("fr")).unwrap();
    let second = engine.localize_url(Some("/shop?ref=42"), Some("fr")).unwrap();

    assert_eq!(first, "/fr/shop?ref=42");
    assert_eq!(first, second);
    assert!(store.is_empty());

    let metrics = engine.cache_metrics();
    assert_eq!(metrics.local_hits, 1);
    assert_eq!(metrics.external_writes, 0);
    assert_eq!(metrics.external_skips, 1);
}

#[test]
fn test_kind_outside_allow_list_stays_local() {
    let store = Arc::new(MemoryCacheStore::new());
    let engine = engine_with(external_config(&["translate_static_about"]), Some(store.clone()));

    engine
        .get_localized_url(&LocalizedUrlRequest::to("fr").with_url("/shop/lamps/desk-lamp"))
        .unwrap();
    assert!(store.is_empty());

    engine.localize_url(Some("/about"), Some("fr")).unwrap();
    assert_eq!(store.len(), 1);
}

#[test]
fn test_external_hit_copied_locally() {
    let store = Arc::new(MemoryCacheStore::new());
    let config = external_config(&["translate_static_about"]);

    let writer = engine_with(config.clone(), Some(store.clone()));
    writer.localize_url(Some("/about"), Some("de")).unwrap();

    let reader = engine_with(config, Some(store.clone()));
    assert_eq!(reader.localize_url(Some("/about"), Some("de")).unwrap(), "/de/ueber-uns");
    assert_eq!(reader.localize_url(Some("/about"), Some("de")).unwrap(), "/de/ueber-uns");

    let metrics = reader.cache_metrics();
    assert_eq!(metrics.external_hits, 1);
    assert_eq!(metrics.local_hits, 1);
    assert_eq!(metrics.misses, 0);
}

#[test]
fn test_locale_change_uses_new_cache_entry() {
    let store = Arc::new(MemoryCacheStore::new());
    let engine = engine_with(external_config(&["translate_fallback"]), Some(store.clone()));

    engine.set_locale(Some("fr"));
    let french = engine.localize_url(Some("/contact"), None).unwrap();
    engine.set_locale(Some("de"));
    let german = engine.localize_url(Some("/contact"), None).unwrap();

    assert_eq!(french, "/fr/contact");
    assert_eq!(german, "/de/contact");
    assert_eq!(store.len(), 2);
}

// ==================== Determinism ====================

proptest! {
    #[test]
    fn prop_equal_requests_give_equal_urls(
        segments in prop::collection::vec("[a-z]{1,8}", 0..4),
        locale in prop::sample::select(vec!["en", "fr", "de"]),
        cached in any::<bool>(),
    ) {
        let url = format!("/{}", segments.join("/"));
        let mut request = LocalizedUrlRequest::to(locale).with_url(&url);
        request.cache_allowed = cached;

        let localizer = engine();
        let first = localizer.get_localized_url(&request).unwrap();
        let again = localizer.get_localized_url(&request).unwrap();
        let fresh = engine().get_localized_url(&request).unwrap();

        prop_assert_eq!(&first, &again);
        prop_assert_eq!(&first, &fresh);
    }
}
