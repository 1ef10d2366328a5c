//! Route registry: the routes the localizer knows about.
//!
//! Built once from the application's route table. Routes are kept in
//! registration order because reverse resolution and static matching are
//! first-match-wins over that order.

use crate::error::{LocalizationError, Result};
use crate::routing::template::RouteTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A route as registered by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub name: String,

    /// URI template, e.g. `/shop/{category}/{product}`
    pub uri: String,

    /// Marks a route whose parameters are entity slugs.
    #[serde(default)]
    pub dynamic: bool,

    /// Per-locale templates for static-translatable routes.
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}

impl RouteDefinition {
    pub fn new(name: &str, uri: &str) -> Self {
        Self {
            name: name.to_string(),
            uri: uri.to_string(),
            dynamic: false,
            translations: BTreeMap::new(),
        }
    }

    pub fn make_dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    pub fn with_translation(mut self, locale: &str, template: &str) -> Self {
        self.translations
            .insert(locale.to_string(), template.to_string());
        self
    }
}

/// A dynamic route: its template and the parameters it declares.
#[derive(Debug, Clone)]
pub struct DynamicRoute {
    pub name: String,
    pub template: RouteTemplate,
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl DynamicRoute {
    /// All declared parameters, required first, in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .map(String::as_str)
    }
}

/// A static route translated through per-locale templates.
#[derive(Debug, Clone)]
pub struct StaticRoute {
    pub name: String,
    pub templates: BTreeMap<String, RouteTemplate>,
}

impl StaticRoute {
    pub fn template_for(&self, locale: &str) -> Option<&RouteTemplate> {
        self.templates.get(locale)
    }
}

#[derive(Debug, Clone)]
pub enum RouteDescriptor {
    Static(StaticRoute),
    Dynamic(DynamicRoute),
}

impl RouteDescriptor {
    pub fn name(&self) -> &str {
        match self {
            RouteDescriptor::Static(route) => &route.name,
            RouteDescriptor::Dynamic(route) => &route.name,
        }
    }
}

#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<RouteDescriptor>,
}

impl RouteRegistry {
    /// Build the registry from the application's routes.
    ///
    /// A route becomes dynamic when it is flagged `dynamic` or listed in
    /// `dynamic_route_names`; otherwise it is static-translatable if it has
    /// per-locale templates, and ignored if it has neither. When two routes
    /// share a name the first registration wins.
    pub fn build(routes: &[RouteDefinition], dynamic_route_names: &[String]) -> Result<Self> {
        let mut registry = RouteRegistry::default();

        for route in routes {
            if route.name.is_empty() {
                continue;
            }
            if registry.lookup(&route.name).is_some() {
                warn!(
                    "Route '{}' is registered more than once, keeping the first registration",
                    route.name
                );
                continue;
            }

            let is_dynamic = route.dynamic || dynamic_route_names.contains(&route.name);
            let descriptor = if is_dynamic {
                let template = RouteTemplate::parse(&route.uri)?;
                RouteDescriptor::Dynamic(DynamicRoute {
                    name: route.name.clone(),
                    required: to_owned(template.required_parameters()),
                    optional: to_owned(template.optional_parameters()),
                    template,
                })
            } else if !route.translations.is_empty() {
                let templates = route
                    .translations
                    .iter()
                    .map(|(locale, uri)| Ok((locale.clone(), RouteTemplate::parse(uri)?)))
                    .collect::<Result<BTreeMap<_, _>>>()?;
                RouteDescriptor::Static(StaticRoute {
                    name: route.name.clone(),
                    templates,
                })
            } else {
                continue;
            };

            registry.routes.push(descriptor);
        }

        for name in dynamic_route_names {
            if !registry.is_dynamic(name) {
                warn!("Dynamic route candidate '{}' is not a registered route", name);
            }
        }

        info!(
            "Route registry built: {} dynamic, {} static",
            registry.dynamic_routes().count(),
            registry.static_routes().count()
        );

        Ok(registry)
    }

    pub fn lookup(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|route| route.name() == name)
    }

    pub fn dynamic_route(&self, name: &str) -> Result<&DynamicRoute> {
        match self.lookup(name) {
            Some(RouteDescriptor::Dynamic(route)) => Ok(route),
            _ => Err(LocalizationError::RouteNotFound(name.to_string())),
        }
    }

    pub fn static_route(&self, name: &str) -> Option<&StaticRoute> {
        match self.lookup(name) {
            Some(RouteDescriptor::Static(route)) => Some(route),
            _ => None,
        }
    }

    pub fn is_dynamic(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(RouteDescriptor::Dynamic(_)))
    }

    /// Dynamic routes in registration order.
    pub fn dynamic_routes(&self) -> impl Iterator<Item = &DynamicRoute> {
        self.routes.iter().filter_map(|route| match route {
            RouteDescriptor::Dynamic(route) => Some(route),
            RouteDescriptor::Static(_) => None,
        })
    }

    /// Static-translatable routes in registration order.
    pub fn static_routes(&self) -> impl Iterator<Item = &StaticRoute> {
        self.routes.iter().filter_map(|route| match route {
            RouteDescriptor::Static(route) => Some(route),
            RouteDescriptor::Dynamic(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn to_owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(String::from).collect()
}
