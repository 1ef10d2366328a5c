//! Slug resolution: mapping entity ids to locale-specific slugs and back.
//!
//! Each entity type provides a [`SlugResolver`]. Route parameters are bound
//! to resolvers by configuration (`ResolverBindings`), and the concrete
//! implementations are registered by id in [`SlugResolvers`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

pub type EntityId = u64;

/// Entities recovered from a path, keyed by route parameter name.
pub type ResolvedEntities = BTreeMap<String, EntityId>;

/// Lookup capability for one entity type.
pub trait SlugResolver: Send + Sync {
    /// Slug of entity `id` in `locale`, as used for route parameter `param`.
    fn slug_for_id(&self, id: EntityId, param: &str, locale: &str) -> Option<String>;

    /// Entity (or entities) named by `slug` in `locale`.
    ///
    /// `resolved` holds the entities already recovered from earlier path
    /// segments, so a slug that is only unique within its parent can be
    /// disambiguated. An empty map means "not found".
    fn entity_for_slug(
        &self,
        slug: &str,
        locale: &str,
        resolved: &ResolvedEntities,
    ) -> ResolvedEntities;
}

/// One configured binding: a resolver id and the parameters it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverBinding {
    pub resolver: String,
    pub params: Vec<String>,
}

impl ResolverBinding {
    pub fn new(resolver: &str, params: &[&str]) -> Self {
        Self {
            resolver: resolver.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Ordered parameter-to-resolver bindings. The first binding that names a
/// parameter wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverBindings {
    bindings: Vec<ResolverBinding>,
}

impl ResolverBindings {
    pub fn new(bindings: Vec<ResolverBinding>) -> Self {
        Self { bindings }
    }

    pub fn resolver_for(&self, param: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|binding| binding.params.iter().any(|p| p == param))
            .map(|binding| binding.resolver.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolverBinding> {
        self.bindings.iter()
    }

    /// Parameters named by more than one binding.
    pub fn shadowed_params(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut shadowed: Vec<&str> = Vec::new();
        for param in self.bindings.iter().flat_map(|b| b.params.iter()) {
            if seen.contains(&param.as_str()) {
                if !shadowed.contains(&param.as_str()) {
                    shadowed.push(param);
                }
            } else {
                seen.push(param);
            }
        }
        shadowed
    }
}

/// Bindings plus the resolver implementations they refer to.
#[derive(Clone, Default)]
pub struct SlugResolvers {
    bindings: ResolverBindings,
    resolvers: HashMap<String, Arc<dyn SlugResolver>>,
}

impl SlugResolvers {
    pub fn new(bindings: ResolverBindings) -> Self {
        Self {
            bindings,
            resolvers: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: &str, resolver: Arc<dyn SlugResolver>) {
        self.resolvers.insert(id.to_string(), resolver);
    }

    pub fn bindings(&self) -> &ResolverBindings {
        &self.bindings
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.resolvers.contains_key(id)
    }

    /// The resolver implementation serving `param`, if one is bound and
    /// registered.
    pub fn for_param(&self, param: &str) -> Option<&dyn SlugResolver> {
        let id = self.bindings.resolver_for(param)?;
        match self.resolvers.get(id) {
            Some(resolver) => Some(resolver.as_ref()),
            None => {
                warn!(
                    "Parameter '{}' is bound to resolver '{}', which is not registered",
                    param, id
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for SlugResolvers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.resolvers.keys().collect();
        ids.sort();
        f.debug_struct("SlugResolvers")
            .field("bindings", &self.bindings)
            .field("resolvers", &ids)
            .finish()
    }
}

/// Parent an entity's slug is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub param: String,
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugEntry {
    pub param: String,
    pub id: EntityId,
    /// Slug per locale code
    pub slugs: BTreeMap<String, String>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
}

/// In-memory resolver over a fixed slug table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticSlugResolver {
    entries: Vec<SlugEntry>,
}

impl StaticSlugResolver {
    pub fn new(entries: Vec<SlugEntry>) -> Self {
        Self { entries }
    }

    pub fn insert(&mut self, param: &str, id: EntityId, slugs: &[(&str, &str)]) -> &mut Self {
        self.entries.push(SlugEntry {
            param: param.to_string(),
            id,
            slugs: slugs
                .iter()
                .map(|(locale, slug)| (locale.to_string(), slug.to_string()))
                .collect(),
            parent: None,
        });
        self
    }

    /// Scope the most recently inserted entry to a parent entity.
    pub fn within(&mut self, param: &str, id: EntityId) -> &mut Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.parent = Some(ParentRef {
                param: param.to_string(),
                id,
            });
        }
        self
    }
}

impl SlugResolver for StaticSlugResolver {
    fn slug_for_id(&self, id: EntityId, param: &str, locale: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|entry| entry.id == id && entry.param == param)
            .and_then(|entry| entry.slugs.get(locale).cloned())
    }

    fn entity_for_slug(
        &self,
        slug: &str,
        locale: &str,
        resolved: &ResolvedEntities,
    ) -> ResolvedEntities {
        self.entries
            .iter()
            .filter(|entry| entry.slugs.get(locale).map(String::as_str) == Some(slug))
            .find(|entry| match &entry.parent {
                Some(parent) => resolved.get(&parent.param) == Some(&parent.id),
                None => true,
            })
            .map(|entry| ResolvedEntities::from([(entry.param.clone(), entry.id)]))
            .unwrap_or_default()
    }
}
