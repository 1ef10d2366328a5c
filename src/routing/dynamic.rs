//! Dynamic route translation: building slug paths from entity ids and
//! recovering entity ids from slug paths.

use crate::error::{LocalizationError, Result};
use crate::routing::registry::{DynamicRoute, RouteRegistry};
use crate::routing::template::Segment;
use crate::routing::Attributes;
use crate::slug::{EntityId, ResolvedEntities, SlugResolvers};
use crate::url::{strip_base_path, strip_locale_prefix, ParsedUrl};
use std::collections::BTreeSet;
use tracing::debug;

/// A path recognized as a dynamic route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicMatch {
    pub route_name: String,
    pub entities: ResolvedEntities,
}

impl DynamicMatch {
    /// The resolved entity ids as route attributes.
    pub fn attributes(&self) -> Attributes {
        self.entities
            .iter()
            .map(|(param, id)| (param.clone(), id.to_string()))
            .collect()
    }
}

pub struct DynamicRouteTranslator<'a> {
    registry: &'a RouteRegistry,
    resolvers: &'a SlugResolvers,
}

impl<'a> DynamicRouteTranslator<'a> {
    pub fn new(registry: &'a RouteRegistry, resolvers: &'a SlugResolvers) -> Self {
        Self {
            registry,
            resolvers,
        }
    }

    /// Build the locale-specific path of a dynamic route.
    ///
    /// With `slugs_resolved`, attribute values are used verbatim; otherwise
    /// they are entity ids and each is replaced by its slug in `locale`.
    /// Returns `Ok(None)` when some value is not an entity id or has no slug
    /// in `locale`. The path has no leading slash.
    pub fn build_url(
        &self,
        locale: &str,
        route_name: &str,
        attributes: &Attributes,
        slugs_resolved: bool,
    ) -> Result<Option<String>> {
        let route = self.registry.dynamic_route(route_name)?;

        if let Some(missing) = route
            .required
            .iter()
            .find(|param| value_of(attributes, param).is_none())
        {
            return Err(LocalizationError::MissingParameter {
                route: route.name.clone(),
                parameter: missing.clone(),
            });
        }

        let mut parts: Vec<String> = Vec::with_capacity(route.template.segments().len());
        for segment in route.template.segments() {
            let (name, value) = match segment {
                Segment::Literal(text) => {
                    parts.push(text.clone());
                    continue;
                }
                Segment::Param { name, .. } => match value_of(attributes, name) {
                    Some(value) => (name, value),
                    // Optional parameters are trailing; the first gap ends the path.
                    None => break,
                },
            };

            if slugs_resolved {
                parts.push(value.to_string());
                continue;
            }

            match self.slug_for(route, name, value, locale) {
                Some(slug) => parts.push(slug),
                None => return Ok(None),
            }
        }

        Ok(Some(parts.join("/")))
    }

    fn slug_for(
        &self,
        route: &DynamicRoute,
        param: &str,
        value: &str,
        locale: &str,
    ) -> Option<String> {
        let Ok(id) = value.trim().parse::<EntityId>() else {
            debug!(
                "Parameter '{}' of route '{}' is not an entity id: '{}'",
                param, route.name, value
            );
            return None;
        };

        let Some(resolver) = self.resolvers.for_param(param) else {
            debug!("No slug resolver for parameter '{}'", param);
            return None;
        };

        let slug = resolver.slug_for_id(id, param, locale);
        if slug.is_none() {
            debug!(
                "No '{}' slug for {} #{} in route '{}'",
                locale, param, id, route.name
            );
        }
        slug
    }

    /// Recognize `url` as one of the dynamic routes.
    ///
    /// The base path and any leading locale segment are removed, then every
    /// dynamic route is tried in registration order. A route matches when
    /// the path has as many segments as its template and fits it, every
    /// captured slug resolves in `source_locale`, and the resolved parameter
    /// names are exactly the declared ones. The first such route wins.
    pub fn resolve_from_path(
        &self,
        url: &str,
        source_locale: &str,
        supported_locales: &[&str],
        base_path: &str,
    ) -> Option<DynamicMatch> {
        let parsed = ParsedUrl::parse(url);
        let path = strip_base_path(&parsed.path, base_path);
        let (_, segments) = strip_locale_prefix(path, supported_locales);

        for route in self.registry.dynamic_routes() {
            if segments.len() != route.template.segments().len() {
                continue;
            }
            let Some(captures) = route.template.match_segments(&segments) else {
                continue;
            };
            if captures.is_empty() {
                continue;
            }

            if let Some(entities) = self.resolve_captures(route, &captures, source_locale) {
                debug!("Path '{}' resolved to dynamic route '{}'", path, route.name);
                return Some(DynamicMatch {
                    route_name: route.name.clone(),
                    entities,
                });
            }
        }

        None
    }

    fn resolve_captures(
        &self,
        route: &DynamicRoute,
        captures: &[(String, String)],
        locale: &str,
    ) -> Option<ResolvedEntities> {
        let mut resolved = ResolvedEntities::new();

        for (param, slug) in captures {
            let resolver = self.resolvers.for_param(param)?;
            let found = resolver.entity_for_slug(slug, locale, &resolved);
            if found.is_empty() {
                return None;
            }
            resolved.extend(found);
        }

        let declared: BTreeSet<&str> = route.parameters().collect();
        let recovered: BTreeSet<&str> = resolved.keys().map(String::as_str).collect();
        if declared == recovered {
            Some(resolved)
        } else {
            None
        }
    }
}

fn value_of<'v>(attributes: &'v Attributes, param: &str) -> Option<&'v str> {
    attributes
        .get(param)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
