//! Current-route context, supplied by the application's dispatcher.

use crate::routing::Attributes;
use parking_lot::RwLock;

/// What the dispatcher knows about the request being handled.
pub trait RouteContext: Send + Sync {
    fn has_current_route(&self) -> bool {
        self.current_route_name().is_some()
    }

    fn current_route_name(&self) -> Option<String>;

    fn current_route_parameters(&self) -> Attributes;

    /// Full URL of the current request, query string included.
    fn full_url(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
struct CurrentRequest {
    route_name: Option<String>,
    parameters: Attributes,
    full_url: Option<String>,
}

/// Context that the application updates as each request is dispatched.
#[derive(Debug, Default)]
pub struct RequestRouteContext {
    current: RwLock<CurrentRequest>,
}

impl RequestRouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_route(&self, name: Option<&str>, parameters: Attributes) {
        let mut current = self.current.write();
        current.route_name = name.map(String::from);
        current.parameters = parameters;
    }

    pub fn set_full_url(&self, url: Option<&str>) {
        self.current.write().full_url = url.map(String::from);
    }

    pub fn clear(&self) {
        *self.current.write() = CurrentRequest::default();
    }
}

impl RouteContext for RequestRouteContext {
    fn current_route_name(&self) -> Option<String> {
        self.current.read().route_name.clone()
    }

    fn current_route_parameters(&self) -> Attributes {
        self.current.read().parameters.clone()
    }

    fn full_url(&self) -> Option<String> {
        self.current.read().full_url.clone()
    }
}
