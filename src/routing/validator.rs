//! Route table validation.
//!
//! Checks a built registry against the supported locales and the configured
//! slug resolvers, so gaps show up at startup instead of as silently
//! unlocalized URLs.

use crate::routing::registry::RouteRegistry;
use crate::routing::template::Segment;
use crate::slug::SlugResolvers;

/// Validation report containing errors and warnings about a route table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Problems that make some routes impossible to localize
    pub errors: Vec<String>,

    /// Gaps that degrade to a fallback URL
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

pub struct RouteTableValidator;

impl RouteTableValidator {
    /// Validate a registry.
    ///
    /// This checks that:
    /// - every static route has a template for every supported locale
    /// - a static route's templates declare the same parameters in every locale
    /// - every dynamic-route parameter is bound to a registered resolver
    /// - no parameter is bound to more than one resolver
    /// - no two dynamic routes have the same shape
    pub fn validate(
        registry: &RouteRegistry,
        supported_locales: &[&str],
        resolvers: &SlugResolvers,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        for route in registry.static_routes() {
            for locale in supported_locales {
                if route.template_for(locale).is_none() {
                    report.warnings.push(format!(
                        "Static route '{}' has no template for locale '{}'",
                        route.name, locale
                    ));
                }
            }

            let mut param_sets = route.templates.iter().map(|(locale, template)| {
                let mut params = template.parameter_names();
                params.sort_unstable();
                (locale, params)
            });
            if let Some((first_locale, first)) = param_sets.next() {
                for (locale, params) in param_sets {
                    if params != first {
                        report.errors.push(format!(
                            "Static route '{}' declares {:?} in '{}' but {:?} in '{}'",
                            route.name, first, first_locale, params, locale
                        ));
                    }
                }
            }
        }

        for route in registry.dynamic_routes() {
            for param in route.parameters() {
                match resolvers.bindings().resolver_for(param) {
                    None => report.errors.push(format!(
                        "Parameter '{}' of dynamic route '{}' is not bound to a resolver",
                        param, route.name
                    )),
                    Some(id) if !resolvers.is_registered(id) => report.errors.push(format!(
                        "Parameter '{}' of dynamic route '{}' is bound to unregistered resolver '{}'",
                        param, route.name, id
                    )),
                    Some(_) => {}
                }
            }
        }

        for param in resolvers.bindings().shadowed_params() {
            report.warnings.push(format!(
                "Parameter '{}' is bound to more than one resolver, the first binding wins",
                param
            ));
        }

        let routes: Vec<_> = registry.dynamic_routes().collect();
        for (i, earlier) in routes.iter().enumerate() {
            for later in routes.iter().skip(i + 1) {
                if shape(earlier.template.segments()) == shape(later.template.segments()) {
                    report.warnings.push(format!(
                        "Dynamic routes '{}' and '{}' have the same shape, '{}' wins reverse resolution",
                        earlier.name, later.name, earlier.name
                    ));
                }
            }
        }

        report
    }
}

/// Segment shape with parameter names erased.
fn shape(segments: &[Segment]) -> Vec<Option<&str>> {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => Some(text.as_str()),
            Segment::Param { .. } => None,
        })
        .collect()
}
