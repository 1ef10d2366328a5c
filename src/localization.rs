//! URL localization engine.
//!
//! [`Localization`] answers "this route or URL, in that locale". A request
//! goes through the cache first, then the resolution chain:
//!
//! 1. the route currently being dispatched (when no URL is given)
//! 2. dynamic routes, by name or by reverse-resolving slugs in the path
//! 3. static-translatable routes, by matching the path against their
//!    per-locale templates
//! 4. generic prefixing of the path with the target locale
//!
//! Each branch that finds nothing falls through to the next, so the last one
//! always produces a URL.

use crate::cache::{CacheKeyInput, ExternalCacheStore, ResolutionKind, RouteCache};
use crate::config::Config;
use crate::error::{LocalizationError, Result};
use crate::i18n::{Direction, Locale, LocaleCatalog, LocaleConfig, LocaleManager, LocaleProvider};
use crate::metrics::MetricsReport;
use crate::routing::{
    Attributes, DynamicRouteTranslator, RequestRouteContext, RouteContext, RouteDefinition,
    RouteDescriptor, RouteRegistry, RouteTableValidator, StaticRoute, ValidationReport,
};
use crate::slug::{ResolverBindings, SlugResolver, SlugResolvers};
use crate::url::{
    has_query, is_absolute_url, strip_base_path, strip_locale_prefix, BaseUrlProvider, ParsedUrl,
};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, warn};

/// Locale a URL should be produced for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetLocale {
    /// The provider's current locale
    #[default]
    Current,
    Code(String),
    /// No locale segment at all
    Unlocalized,
}

impl From<&str> for TargetLocale {
    fn from(code: &str) -> Self {
        TargetLocale::Code(code.to_string())
    }
}

/// One call to [`Localization::get_localized_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedUrlRequest {
    pub target: TargetLocale,

    /// URL or dynamic route name; `None` means the current request
    pub url: Option<String>,

    /// Route parameters; entity ids unless `slugs_resolved`
    pub attributes: Attributes,

    /// Keep the locale segment even for a hidden default locale
    pub show_hidden_locale: bool,

    /// Locale the URL is written in; defaults to the current locale
    pub source_locale: Option<String>,

    /// Attribute values are already slugs
    pub slugs_resolved: bool,

    pub cache_allowed: bool,
}

impl Default for LocalizedUrlRequest {
    fn default() -> Self {
        Self {
            target: TargetLocale::Current,
            url: None,
            attributes: Attributes::new(),
            show_hidden_locale: false,
            source_locale: None,
            slugs_resolved: false,
            cache_allowed: true,
        }
    }
}

impl LocalizedUrlRequest {
    pub fn new(target: TargetLocale) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Request for an explicit locale code.
    pub fn to(locale: &str) -> Self {
        Self::new(TargetLocale::from(locale))
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn from_locale(mut self, locale: &str) -> Self {
        self.source_locale = Some(locale.to_string());
        self
    }

    pub fn show_hidden_locale(mut self) -> Self {
        self.show_hidden_locale = true;
        self
    }

    pub fn slugs_resolved(mut self) -> Self {
        self.slugs_resolved = true;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_allowed = false;
        self
    }
}

/// Outcome of one branch of the resolution chain.
struct Resolution {
    url: String,
    kind: ResolutionKind,
    /// Attributes used by the branch, explicit or taken from the path
    attributes_used: bool,
}

pub struct LocalizationBuilder {
    config: Config,
    locales: Option<Arc<dyn LocaleProvider>>,
    context: Option<Arc<dyn RouteContext>>,
    base_url_provider: Option<Arc<dyn BaseUrlProvider>>,
    external_cache: Option<Arc<dyn ExternalCacheStore>>,
    routes: Vec<RouteDefinition>,
    resolvers: Vec<(String, Arc<dyn SlugResolver>)>,
}

impl LocalizationBuilder {
    /// Use a custom locale provider instead of a [`LocaleManager`] built
    /// from the config.
    pub fn locale_provider(mut self, provider: Arc<dyn LocaleProvider>) -> Self {
        self.locales = Some(provider);
        self
    }

    pub fn route_context(mut self, context: Arc<dyn RouteContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn base_url_provider(mut self, provider: Arc<dyn BaseUrlProvider>) -> Self {
        self.base_url_provider = Some(provider);
        self
    }

    pub fn external_cache(mut self, store: Arc<dyn ExternalCacheStore>) -> Self {
        self.external_cache = Some(store);
        self
    }

    pub fn route(mut self, route: RouteDefinition) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteDefinition>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Register the resolver implementation for a configured resolver id.
    pub fn slug_resolver(mut self, id: &str, resolver: Arc<dyn SlugResolver>) -> Self {
        self.resolvers.push((id.to_string(), resolver));
        self
    }

    pub fn build(self) -> Result<Localization> {
        let locales: Arc<dyn LocaleProvider> = match self.locales {
            Some(provider) => provider,
            None => Arc::new(LocaleManager::new(
                &self.config.default_locale,
                &self.config.supported_locales,
                self.config.hide_default_locale_in_url,
            )?),
        };
        let context: Arc<dyn RouteContext> = match self.context {
            Some(context) => context,
            None => Arc::new(RequestRouteContext::new()),
        };

        let mut resolvers =
            SlugResolvers::new(ResolverBindings::new(self.config.resolver_bindings.clone()));
        for (id, resolver) in self.resolvers {
            resolvers.register(&id, resolver);
        }

        let base_url = self.config.base_url.as_deref().map(normalize_base_url);
        let cache = RouteCache::new(self.config.cache.clone(), self.external_cache);

        Ok(Localization {
            config: self.config,
            locales,
            context,
            base_url_provider: self.base_url_provider,
            routes: self.routes,
            resolvers,
            registry: OnceLock::new(),
            registry_init: Mutex::new(()),
            cache,
            base_url: RwLock::new(base_url),
        })
    }
}

/// The localization engine. One instance per application; share it behind
/// an `Arc`.
pub struct Localization {
    config: Config,
    locales: Arc<dyn LocaleProvider>,
    context: Arc<dyn RouteContext>,
    base_url_provider: Option<Arc<dyn BaseUrlProvider>>,
    routes: Vec<RouteDefinition>,
    resolvers: SlugResolvers,
    registry: OnceLock<RouteRegistry>,
    registry_init: Mutex<()>,
    cache: RouteCache,
    base_url: RwLock<Option<String>>,
}

impl Localization {
    pub fn builder(config: Config) -> LocalizationBuilder {
        LocalizationBuilder {
            config,
            locales: None,
            context: None,
            base_url_provider: None,
            external_cache: None,
            routes: Vec::new(),
            resolvers: Vec::new(),
        }
    }

    /// The route registry, built on first use.
    ///
    /// Concurrent first calls build it once; the others wait and share the
    /// result. The built table is validated and findings are logged.
    pub fn registry(&self) -> Result<&RouteRegistry> {
        if let Some(registry) = self.registry.get() {
            return Ok(registry);
        }

        let _guard = self.registry_init.lock();
        if let Some(registry) = self.registry.get() {
            return Ok(registry);
        }

        let registry = RouteRegistry::build(&self.routes, &self.config.dynamic_route_names)?;
        let report = self.validate_registry(&registry);
        for finding in &report.errors {
            error!("Route table: {}", finding);
        }
        for finding in &report.warnings {
            warn!("Route table: {}", finding);
        }

        Ok(self.registry.get_or_init(|| registry))
    }

    /// Check the route table against the supported locales and the
    /// registered slug resolvers.
    pub fn validate(&self) -> Result<ValidationReport> {
        Ok(self.validate_registry(self.registry()?))
    }

    fn validate_registry(&self, registry: &RouteRegistry) -> ValidationReport {
        let codes = self.supported_locale_keys();
        RouteTableValidator::validate(registry, &codes, &self.resolvers)
    }

    // ==================== Resolution ====================

    /// Localize a route or URL.
    ///
    /// Fails only on invalid input: an unsupported target or source locale,
    /// an unknown dynamic route name, or a missing dynamic-route parameter.
    /// Every other miss falls through to generic prefixing.
    pub fn get_localized_url(&self, request: &LocalizedUrlRequest) -> Result<String> {
        let current = self.locales.current_locale();
        let target = match &request.target {
            TargetLocale::Current => Some(current.code().to_string()),
            TargetLocale::Code(code) => Some(code.clone()),
            TargetLocale::Unlocalized => None,
        };
        let explicit_source = request.source_locale.as_deref().filter(|s| !s.is_empty());
        let source = explicit_source.unwrap_or(current.code());

        let explicit_url = request.url.as_deref().filter(|u| !u.is_empty());
        let request_url = self.context.full_url().unwrap_or_default();
        let current_route = match explicit_url {
            Some(_) => None,
            None => self
                .context
                .current_route_name()
                .map(|name| (name, self.context.current_route_parameters())),
        };
        let url = explicit_url.unwrap_or(request_url.as_str());
        let base_url = self.base_url.read().clone();

        let key = self.cache.key(&CacheKeyInput {
            target: target.as_deref(),
            source,
            url,
            route: current_route.as_ref().map(|(name, _)| name.as_str()),
            route_parameters: current_route.as_ref().map(|(_, parameters)| parameters),
            attributes: &request.attributes,
            show_hidden_locale: request.show_hidden_locale,
            slugs_resolved: request.slugs_resolved,
            base_url: base_url.as_deref(),
        });

        if request.cache_allowed {
            if let Some(hit) = self.cache.get(&key) {
                debug!("Cache hit for '{}' -> {}", url, hit);
                return Ok(hit);
            }
        }

        if let Some(target) = target.as_deref() {
            self.ensure_supported(target)?;
        }
        if let Some(source) = explicit_source {
            self.ensure_supported(source)?;
        }

        let resolution = match target.as_deref() {
            Some(target) => self.resolve(request, target, source, url, current_route)?,
            None => Resolution {
                url: self.prefixed_url(None, url, false),
                kind: ResolutionKind::Fallback,
                attributes_used: false,
            },
        };

        if request.cache_allowed {
            let forever = request.attributes.is_empty() && !resolution.attributes_used;
            self.cache
                .put(&key, &resolution.url, &resolution.kind, has_query(url), forever);
        }

        Ok(resolution.url)
    }

    fn resolve(
        &self,
        request: &LocalizedUrlRequest,
        target: &str,
        source: &str,
        url: &str,
        current_route: Option<(String, Attributes)>,
    ) -> Result<Resolution> {
        let registry = self.registry()?;

        if let Some((route, parameters)) = current_route {
            let attributes = if request.attributes.is_empty() {
                parameters
            } else {
                request.attributes.clone()
            };
            let found = self.get_url_from_route_name(
                target,
                &route,
                &attributes,
                request.show_hidden_locale,
                request.slugs_resolved,
            )?;
            if let Some(found) = found {
                debug!("Translated current route '{}' to {}", route, found);
                return Ok(Resolution {
                    url: found,
                    kind: ResolutionKind::CurrentRoute(route),
                    attributes_used: !attributes.is_empty(),
                });
            }
            debug!("Current route '{}' has no '{}' URL", route, target);
        }

        if let Some(resolution) = self.translate_dynamic(registry, request, target, source, url)? {
            return Ok(resolution);
        }

        if let Some(resolution) = self.translate_static(registry, request, target, source, url)? {
            return Ok(resolution);
        }

        debug!("No route matched '{}', prefixing with '{}'", url, target);
        Ok(Resolution {
            url: self.prefixed_url(Some(target), url, request.show_hidden_locale),
            kind: ResolutionKind::Fallback,
            attributes_used: false,
        })
    }

    fn translate_dynamic(
        &self,
        registry: &RouteRegistry,
        request: &LocalizedUrlRequest,
        target: &str,
        source: &str,
        url: &str,
    ) -> Result<Option<Resolution>> {
        if registry.is_dynamic(url) {
            let found = self.get_url_from_route_name(
                target,
                url,
                &request.attributes,
                request.show_hidden_locale,
                request.slugs_resolved,
            )?;
            return Ok(found.map(|found| Resolution {
                url: found,
                kind: ResolutionKind::Dynamic(url.to_string()),
                attributes_used: !request.attributes.is_empty(),
            }));
        }

        if target == source {
            return Ok(None);
        }

        let codes = self.supported_locale_keys();
        let translator = DynamicRouteTranslator::new(registry, &self.resolvers);
        let Some(matched) = translator.resolve_from_path(url, source, &codes, &self.config.base_path)
        else {
            return Ok(None);
        };

        let attributes = matched.attributes();
        let path = translator.build_url(target, &matched.route_name, &attributes, false)?;
        Ok(path.map(|path| {
            let found = self.create_url_from_uri(&self.localized_path(
                target,
                &path,
                request.show_hidden_locale,
            ));
            debug!(
                "Reverse-resolved '{}' as dynamic route '{}' -> {}",
                url, matched.route_name, found
            );
            Resolution {
                url: carry_query(found, url),
                kind: ResolutionKind::Dynamic(matched.route_name),
                attributes_used: true,
            }
        }))
    }

    fn translate_static(
        &self,
        registry: &RouteRegistry,
        request: &LocalizedUrlRequest,
        target: &str,
        source: &str,
        url: &str,
    ) -> Result<Option<Resolution>> {
        let current = self.locales.current_locale();
        let default = self.locales.default_locale();
        let mut lookup_locales: Vec<&str> = Vec::with_capacity(3);
        for locale in [source, current.code(), default.code()] {
            if !lookup_locales.contains(&locale) {
                lookup_locales.push(locale);
            }
        }

        let Some((route, mut attributes)) = self.match_static(registry, url, &lookup_locales) else {
            return Ok(None);
        };
        let extracted = !attributes.is_empty();
        attributes.extend(request.attributes.clone());

        let Some(path) = route
            .template_for(target)
            .and_then(|template| template.substitute(&attributes))
        else {
            debug!("Static route '{}' has no '{}' template", route.name, target);
            return Ok(None);
        };

        let found = self.create_url_from_uri(&self.localized_path(
            target,
            &path,
            request.show_hidden_locale,
        ));
        debug!("Matched '{}' to static route '{}' -> {}", url, route.name, found);
        Ok(Some(Resolution {
            url: carry_query(found, url),
            kind: ResolutionKind::Static(route.name.clone()),
            attributes_used: extracted || !request.attributes.is_empty(),
        }))
    }

    /// First static route whose template in one of `locales` matches the
    /// path of `url`, with the values captured from the path.
    fn match_static<'r>(
        &self,
        registry: &'r RouteRegistry,
        url: &str,
        locales: &[&str],
    ) -> Option<(&'r StaticRoute, Attributes)> {
        let parsed = ParsedUrl::parse(url);
        let path = strip_base_path(&parsed.path, &self.config.base_path);
        let codes = self.supported_locale_keys();
        let (_, segments) = strip_locale_prefix(path, &codes);

        registry.static_routes().find_map(|route| {
            locales.iter().find_map(|locale| {
                let captures = route.template_for(locale)?.match_segments(&segments)?;
                Some((route, captures.into_iter().collect::<Attributes>()))
            })
        })
    }

    /// URL of a named route in `locale`.
    ///
    /// `Ok(None)` when the route is unknown, has no template for `locale`,
    /// or one of its entities has no slug in `locale`.
    pub fn get_url_from_route_name(
        &self,
        locale: &str,
        route_name: &str,
        attributes: &Attributes,
        show_hidden_locale: bool,
        slugs_resolved: bool,
    ) -> Result<Option<String>> {
        self.ensure_supported(locale)?;
        let registry = self.registry()?;

        let path = match registry.lookup(route_name) {
            Some(RouteDescriptor::Dynamic(_)) => DynamicRouteTranslator::new(registry, &self.resolvers)
                .build_url(locale, route_name, attributes, slugs_resolved)?,
            Some(RouteDescriptor::Static(route)) => route
                .template_for(locale)
                .and_then(|template| template.substitute(attributes)),
            None => {
                debug!("Route '{}' is not localizable", route_name);
                None
            }
        };

        Ok(path.map(|path| {
            self.create_url_from_uri(&self.localized_path(locale, &path, show_hidden_locale))
        }))
    }

    /// Same as [`get_localized_url`](Self::get_localized_url) with the
    /// current locale by default.
    pub fn localize_url(&self, url: Option<&str>, locale: Option<&str>) -> Result<String> {
        let mut request = LocalizedUrlRequest::new(match locale {
            Some(code) => TargetLocale::from(code),
            None => TargetLocale::Current,
        });
        request.url = url.map(String::from);
        self.get_localized_url(&request)
    }

    /// The URL with its locale segment removed.
    pub fn get_non_localized_url(&self, url: Option<&str>) -> Result<String> {
        let mut request = LocalizedUrlRequest::new(TargetLocale::Unlocalized);
        request.url = url.map(String::from);
        self.get_localized_url(&request)
    }

    /// Template of a route in the current locale, falling back to the
    /// default locale.
    pub fn trans_route(&self, route_name: &str) -> Result<Option<String>> {
        let registry = self.registry()?;
        let current = self.locales.current_locale();
        let default = self.locales.default_locale();

        Ok(match registry.lookup(route_name) {
            Some(RouteDescriptor::Static(route)) => route
                .template_for(current.code())
                .or_else(|| route.template_for(default.code()))
                .map(|template| template.raw().to_string()),
            Some(RouteDescriptor::Dynamic(route)) => Some(route.template.raw().to_string()),
            None => None,
        })
    }

    /// Name of the route a URL written in `locale` points to.
    pub fn route_name_from_path(&self, url: &str, locale: &str) -> Result<Option<String>> {
        self.ensure_supported(locale)?;
        let registry = self.registry()?;

        if let Some((route, _)) = self.match_static(registry, url, &[locale]) {
            return Ok(Some(route.name.clone()));
        }

        let codes = self.supported_locale_keys();
        Ok(DynamicRouteTranslator::new(registry, &self.resolvers)
            .resolve_from_path(url, locale, &codes, &self.config.base_path)
            .map(|matched| matched.route_name))
    }

    // ==================== URL Building ====================

    /// `/[base path]/[locale]/path`, without the locale when it is the
    /// hidden default.
    fn localized_path(&self, locale: &str, path: &str, show_hidden_locale: bool) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        let base = self.config.base_path.trim_matches('/');
        if !base.is_empty() {
            parts.push(base);
        }
        if self.shows_locale(locale, show_hidden_locale) {
            parts.push(locale);
        }
        let path = path.trim_matches('/');
        if !path.is_empty() {
            parts.push(path);
        }
        format!("/{}", parts.join("/"))
    }

    fn shows_locale(&self, locale: &str, show_hidden_locale: bool) -> bool {
        locale != self.locales.default_locale().code()
            || !self.locales.is_default_locale_hidden_in_url()
            || show_hidden_locale
    }

    /// Replace any locale segment of `url` with `target` (or none), keeping
    /// origin, query and fragment.
    fn prefixed_url(&self, target: Option<&str>, url: &str, show_hidden_locale: bool) -> String {
        let mut parsed = ParsedUrl::parse(url);
        let codes = self.supported_locale_keys();
        let stripped = {
            let path = strip_base_path(&parsed.path, &self.config.base_path);
            let (_, segments) = strip_locale_prefix(path, &codes);
            segments.join("/")
        };

        parsed.path = match target {
            Some(locale) => self.localized_path(locale, &stripped, show_hidden_locale),
            None => {
                let base = self.config.base_path.trim_matches('/');
                match (base.is_empty(), stripped.is_empty()) {
                    (true, _) => format!("/{}", stripped),
                    (false, true) => format!("/{}", base),
                    (false, false) => format!("/{}/{}", base, stripped),
                }
            }
        };

        let composed = parsed.unparse();
        if is_absolute_url(&composed) {
            composed
        } else {
            self.create_url_from_uri(&composed)
        }
    }

    /// Absolute URL for an application path, through the configured base
    /// URL or the base-URL provider. Without either the path stays relative.
    pub fn create_url_from_uri(&self, uri: &str) -> String {
        let uri = uri.trim_start_matches('/');
        if let Some(base) = self.base_url.read().as_deref() {
            return format!("{}{}", base, uri);
        }
        match &self.base_url_provider {
            Some(provider) => provider.resolve_path(uri),
            None => format!("/{}", uri),
        }
    }

    pub fn set_base_url(&self, url: &str) {
        *self.base_url.write() = Some(normalize_base_url(url));
    }

    // ==================== Locales ====================

    fn ensure_supported(&self, locale: &str) -> Result<()> {
        if self.locales.is_supported(locale) {
            Ok(())
        } else {
            Err(LocalizationError::UnsupportedLocale(locale.to_string()))
        }
    }

    /// Replace the supported locales. Locally cached URLs are dropped since
    /// they may name locales that are no longer served.
    pub fn set_supported_locales(&self, codes: &[String]) -> Result<()> {
        self.locales.set_supported_locales(codes)?;
        self.cache.clear_local();
        Ok(())
    }

    /// Switch the current locale; unsupported codes select the default.
    pub fn set_locale(&self, code: Option<&str>) -> Locale {
        self.locales.set_current_locale(code)
    }

    pub fn default_locale(&self) -> &'static str {
        self.locales.default_locale().code()
    }

    pub fn current_locale(&self) -> &'static str {
        self.locales.current_locale().code()
    }

    pub fn current_locale_entity(&self) -> Locale {
        self.locales.current_locale()
    }

    pub fn current_locale_name(&self) -> &'static str {
        self.locales.current_locale().name()
    }

    pub fn current_locale_native(&self) -> &'static str {
        self.locales.current_locale().native()
    }

    pub fn current_locale_script(&self) -> &'static str {
        self.locales.current_locale().script()
    }

    pub fn current_locale_direction(&self) -> Direction {
        self.locales.current_locale().direction()
    }

    pub fn current_locale_regional(&self) -> &'static str {
        self.locales.current_locale().regional()
    }

    pub fn supported_locales(&self) -> Vec<Locale> {
        self.locales.supported_locales()
    }

    pub fn supported_locale_keys(&self) -> Vec<&'static str> {
        self.locales
            .supported_locales()
            .iter()
            .map(|locale| locale.code())
            .collect()
    }

    /// Every locale the catalog knows, supported or not.
    pub fn all_locales(&self) -> Vec<&'static LocaleConfig> {
        LocaleCatalog::get().list_all()
    }

    pub fn is_locale_supported(&self, code: &str) -> bool {
        self.locales.is_supported(code)
    }

    pub fn is_default_locale_hidden_in_url(&self) -> bool {
        self.locales.is_default_locale_hidden_in_url()
    }

    pub fn cache_metrics(&self) -> MetricsReport {
        self.cache.metrics().report()
    }
}

fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Append the query string and fragment of `source` to a URL built from a
/// route template.
fn carry_query(mut built: String, source: &str) -> String {
    let parsed = ParsedUrl::parse(source);
    if let Some(query) = parsed.query {
        built.push('?');
        built.push_str(&query);
    }
    if let Some(fragment) = parsed.fragment {
        built.push('#');
        built.push_str(&fragment);
    }
    built
}
