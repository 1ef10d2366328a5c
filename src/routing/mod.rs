//! Route table, templates and translation of route paths between locales.

mod context;
mod dynamic;
mod registry;
pub mod template;
mod validator;

use std::collections::BTreeMap;

/// Route parameter values keyed by parameter name.
pub type Attributes = BTreeMap<String, String>;

pub use context::{RequestRouteContext, RouteContext};
pub use dynamic::{DynamicMatch, DynamicRouteTranslator};
pub use registry::{DynamicRoute, RouteDefinition, RouteDescriptor, RouteRegistry, StaticRoute};
pub use template::{RouteTemplate, Segment};
pub use validator::{RouteTableValidator, ValidationReport};
