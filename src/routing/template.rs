//! Route template grammar.
//!
//! A template is a `/`-separated path whose segments are either literal text
//! or a whole-segment parameter: `{name}` (required) or `{name?}` (optional).
//! Optional parameters may only be followed by other optional parameters.

use crate::error::{LocalizationError, Result};
use crate::routing::Attributes;
use regex::Regex;
use std::sync::OnceLock;

static PARAM_REGEX: OnceLock<Regex> = OnceLock::new();

fn param_regex() -> &'static Regex {
    PARAM_REGEX.get_or_init(|| {
        Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_]*)(\?)?\}$").expect("Invalid parameter regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
}

impl Segment {
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Param { name, .. } => Some(name),
            Segment::Literal(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    pub fn parse(uri: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut seen_optional = false;

        for part in split_segments(uri) {
            let segment = match param_regex().captures(part) {
                Some(caps) => Segment::Param {
                    name: caps[1].to_string(),
                    optional: caps.get(2).is_some(),
                },
                None if part.contains('{') || part.contains('}') => {
                    return Err(LocalizationError::RegistryBuild(format!(
                        "segment '{}' in '{}' must be a literal or a whole-segment parameter",
                        part, uri
                    )));
                }
                None => Segment::Literal(part.to_string()),
            };

            match &segment {
                Segment::Param { optional: true, .. } => seen_optional = true,
                _ if seen_optional => {
                    return Err(LocalizationError::RegistryBuild(format!(
                        "'{}' has a required segment after an optional parameter",
                        uri
                    )));
                }
                _ => {}
            }

            if let Some(name) = segment.param_name() {
                if segments.iter().any(|s: &Segment| s.param_name() == Some(name)) {
                    return Err(LocalizationError::RegistryBuild(format!(
                        "parameter '{}' appears twice in '{}'",
                        name, uri
                    )));
                }
            }

            segments.push(segment);
        }

        Ok(Self {
            raw: uri.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in declaration order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.segments.iter().filter_map(Segment::param_name).collect()
    }

    pub fn required_parameters(&self) -> Vec<&str> {
        self.params_where(false)
    }

    pub fn optional_parameters(&self) -> Vec<&str> {
        self.params_where(true)
    }

    fn params_where(&self, want_optional: bool) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param { name, optional } if *optional == want_optional => {
                    Some(name.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Number of segments a matching path must have at minimum.
    fn min_segments(&self) -> usize {
        self.segments.len() - self.optional_parameters().len()
    }

    /// Fill parameters from `attributes`.
    ///
    /// Absent optional parameters are dropped. Returns `None` when a required
    /// parameter has no value. The result has no leading or trailing slash.
    pub fn substitute(&self, attributes: &Attributes) -> Option<String> {
        let mut parts: Vec<&str> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => parts.push(text),
                Segment::Param { name, optional } => match attributes.get(name) {
                    Some(value) if !value.is_empty() => parts.push(value),
                    _ if *optional => {}
                    _ => return None,
                },
            }
        }
        Some(parts.join("/"))
    }

    /// Structurally match path segments against this template.
    ///
    /// Literals must match exactly and parameters accept any non-empty
    /// segment. Returns the captured `(parameter, value)` pairs in
    /// declaration order.
    pub fn match_segments(&self, path: &[&str]) -> Option<Vec<(String, String)>> {
        if path.len() < self.min_segments() || path.len() > self.segments.len() {
            return None;
        }

        let mut captures = Vec::new();
        for (segment, value) in self.segments.iter().zip(path.iter()) {
            match segment {
                Segment::Literal(text) if text == value => {}
                Segment::Literal(_) => return None,
                Segment::Param { .. } if value.is_empty() => return None,
                Segment::Param { name, .. } => captures.push((name.clone(), value.to_string())),
            }
        }
        Some(captures)
    }
}

/// Split a path into its non-empty segments.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
