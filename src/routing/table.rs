//! Route table and dispatch.
//!
//! # Responsibilities
//! - Partition declared routes into static and dynamic
//! - Compile dynamic routes (prefix + segment pattern)
//! - Look up the route for a method and raw request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) static lookup keyed by `METHOD@path`
//! - O(n) dynamic scan per method, in declaration order
//! - No normalization: trailing slash is significant
//! - No match is `None`, never an error

use std::collections::HashMap;

use axum::http::Method;

use crate::routing::matcher::{self, PathPattern};
use crate::routing::route::{RouteDefinition, RouteError, Routes};

/// Methods that may carry dynamic routes.
pub const DYNAMIC_METHODS: [Method; 7] = [
    Method::HEAD,
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// Route parameters extracted from a dynamic route, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Value of the named parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The route selected for a request.
#[derive(Debug)]
pub struct MatchResult<'t> {
    pub route: &'t RouteDefinition,
    pub params: Params,
}

#[derive(Debug)]
struct CompiledRoute {
    definition: RouteDefinition,
    prefix: String,
    pattern: PathPattern,
}

/// Compiled, immutable route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    static_index: HashMap<String, RouteDefinition>,
    dynamic_by_method: HashMap<Method, Vec<CompiledRoute>>,
}

fn static_key(method: &Method, path: &str) -> String {
    format!("{}@{}", method.as_str(), path)
}

impl RouteTable {
    /// Build the table from declared routes.
    ///
    /// Fails on malformed paths and on static routes declared twice.
    /// Duplicate dynamic routes are kept; the first one declared wins.
    pub fn build(routes: Routes) -> Result<Self, RouteError> {
        let definitions = routes
            .into_entries()
            .into_iter()
            .map(RouteDefinition::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let (dynamic, fixed): (Vec<_>, Vec<_>) =
            definitions.into_iter().partition(RouteDefinition::is_dynamic);

        let mut static_index = HashMap::with_capacity(fixed.len());
        for definition in fixed {
            let key = static_key(definition.method(), definition.path());
            if static_index.contains_key(&key) {
                return Err(RouteError::DuplicateRoute {
                    method: definition.method().clone(),
                    path: definition.path().to_string(),
                });
            }
            static_index.insert(key, definition);
        }

        let mut dynamic_by_method: HashMap<Method, Vec<CompiledRoute>> = DYNAMIC_METHODS
            .iter()
            .map(|method| (method.clone(), Vec::new()))
            .collect();

        for definition in dynamic {
            let Some(compiled) = dynamic_by_method.get_mut(definition.method()) else {
                tracing::warn!(
                    method = %definition.method(),
                    path = %definition.path(),
                    "Dynamic route uses an unsupported method and will never match"
                );
                continue;
            };

            if compiled.iter().any(|c| c.definition.path() == definition.path()) {
                tracing::warn!(
                    method = %definition.method(),
                    path = %definition.path(),
                    "Dynamic route declared twice; the first declaration wins"
                );
            }

            let pattern = PathPattern::compile(definition.path());
            debug_assert_eq!(pattern.capture_count(), definition.param_names().len());
            compiled.push(CompiledRoute {
                prefix: matcher::literal_prefix(definition.path()).to_string(),
                pattern,
                definition,
            });
        }

        tracing::debug!(
            static_routes = static_index.len(),
            dynamic_routes = dynamic_by_method.values().map(Vec::len).sum::<usize>(),
            "Route table built"
        );

        Ok(Self {
            static_index,
            dynamic_by_method,
        })
    }

    /// Resolve a method and raw request path (query string allowed).
    pub fn dispatch(&self, method: &Method, raw_path: &str) -> Option<MatchResult<'_>> {
        let path = raw_path.split_once('?').map_or(raw_path, |(path, _)| path);

        if let Some(route) = self.static_index.get(&static_key(method, path)) {
            tracing::trace!(%method, path, "Dispatched to static route");
            return Some(MatchResult {
                route,
                params: Params::empty(),
            });
        }

        let candidates = self.dynamic_by_method.get(method)?;
        for candidate in candidates {
            if !path.starts_with(&candidate.prefix) {
                continue;
            }
            if let Some(values) = candidate.pattern.captures(path) {
                tracing::trace!(%method, path, route = %candidate.definition.path(), "Dispatched to dynamic route");
                let params = candidate
                    .definition
                    .param_names()
                    .iter()
                    .cloned()
                    .zip(values)
                    .collect();
                return Some(MatchResult {
                    route: &candidate.definition,
                    params,
                });
            }
        }

        None
    }

    /// Number of static routes.
    pub fn static_len(&self) -> usize {
        self.static_index.len()
    }

    /// Number of indexed dynamic routes.
    pub fn dynamic_len(&self) -> usize {
        self.dynamic_by_method.values().map(Vec::len).sum()
    }
}
