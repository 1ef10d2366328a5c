//! URL helpers: splitting, recomposing, and locale-prefix handling.

use crate::routing::template::split_segments;
use ::url::{Position, Url};

/// A URL split into origin, path, query and fragment.
///
/// Relative URLs (`/shop?ref=1`) have no origin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedUrl {
    /// `scheme://[user@]host[:port]` for absolute URLs
    pub origin: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl ParsedUrl {
    pub fn parse(raw: &str) -> Self {
        if let Ok(url) = Url::parse(raw) {
            if url.has_host() {
                return Self {
                    origin: Some(url[..Position::BeforePath].to_string()),
                    path: url.path().to_string(),
                    query: url.query().filter(|q| !q.is_empty()).map(String::from),
                    fragment: url.fragment().map(String::from),
                };
            }
        }

        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (raw, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string()).filter(|q| !q.is_empty())),
            None => (rest, None),
        };

        Self {
            origin: None,
            path: path.to_string(),
            query,
            fragment,
        }
    }

    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    /// Recompose the URL. The path is written with a single leading slash
    /// when it is non-empty.
    pub fn unparse(&self) -> String {
        let mut out = String::new();
        if let Some(origin) = &self.origin {
            out.push_str(origin);
        }
        let path = self.path.trim_start_matches('/');
        if !path.is_empty() || self.origin.is_none() {
            out.push('/');
            out.push_str(path);
        }
        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// Whether `raw` carries a non-empty query string.
pub fn has_query(raw: &str) -> bool {
    ParsedUrl::parse(raw).has_query()
}

/// Whether `raw` is a well-formed absolute URL with a host.
pub fn is_absolute_url(raw: &str) -> bool {
    Url::parse(raw).map(|url| url.has_host()).unwrap_or(false)
}

/// Remove the application base path (e.g. `/app`) from the front of `path`.
pub fn strip_base_path<'a>(path: &'a str, base_path: &str) -> &'a str {
    let base = base_path.trim_matches('/');
    if base.is_empty() {
        return path;
    }
    let trimmed = path.trim_start_matches('/');
    match trimmed.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Split off a leading locale segment.
///
/// Returns the locale found (if any) and the remaining segments. Codes are
/// tried longest first so `pt-BR` is never read as `pt`.
pub fn strip_locale_prefix<'a>(path: &'a str, locales: &[&str]) -> (Option<String>, Vec<&'a str>) {
    let segments = split_segments(path);
    if segments.is_empty() {
        return (None, segments);
    }
    let first = segments[0];

    let mut candidates: Vec<&str> = locales.to_vec();
    candidates.sort_by_key(|code| std::cmp::Reverse(code.len()));

    match candidates.into_iter().find(|code| *code == first) {
        Some(code) => (Some(code.to_string()), segments[1..].to_vec()),
        None => (None, segments),
    }
}

/// Resolves application paths into absolute URLs.
pub trait BaseUrlProvider: Send + Sync {
    fn resolve_path(&self, path: &str) -> String;
}

/// Base-URL provider with a fixed application root.
#[derive(Debug, Clone)]
pub struct StaticBaseUrl {
    root: String,
}

impl StaticBaseUrl {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }
}

impl BaseUrlProvider for StaticBaseUrl {
    fn resolve_path(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }
}
