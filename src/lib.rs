//! Route localization: translate application URLs and named routes between
//! locales, including routes whose segments are per-locale entity slugs.

pub mod cache;
pub mod config;
pub mod error;
pub mod i18n;
pub mod localization;
pub mod metrics;
pub mod routing;
pub mod slug;
pub mod url;

pub use crate::cache::{ExternalCacheStore, MemoryCacheStore, ResolutionKind, RouteCache};
pub use crate::config::{CacheConfig, Config, RouteTableFile};
pub use crate::error::{LocalizationError, Result};
pub use crate::i18n::{Direction, Locale, LocaleManager, LocaleProvider};
pub use crate::localization::{Localization, LocalizationBuilder, LocalizedUrlRequest, TargetLocale};
pub use crate::metrics::MetricsReport;
pub use crate::routing::{Attributes, RequestRouteContext, RouteContext, RouteDefinition};
pub use crate::slug::{EntityId, ResolvedEntities, ResolverBinding, SlugResolver, StaticSlugResolver};
pub use crate::url::{BaseUrlProvider, StaticBaseUrl};
