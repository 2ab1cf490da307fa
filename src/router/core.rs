//! Router core - the request-routing hot path.

use crate::error::RegistrationError;
use crate::route::{HandlerSignature, RouteDef};
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path parameters before heap allocation.
/// Most routes have well under 8 (e.g. `/users/{id}/posts/{post_id}`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the static route table;
/// values are per-request data extracted from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A registered route: the compiled registration-time view of a [`RouteDef`].
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub path_pattern: String,
    pub handler_name: String,
    /// Signature derived from the declared spec, cached for the binder.
    pub signature: Arc<HandlerSignature>,
}

/// Result of matching a request path against the route table.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub entry: Arc<RouteEntry>,
    /// Path parameters extracted from the URL (e.g. `{id}` -> `("id", "123")`).
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name. Last occurrence wins for duplicate
    /// names at different path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Startup-built lookup from `(method, path)` to a handler.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<(Method, Regex, Arc<RouteEntry>, Vec<Arc<str>>)>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register one route definition.
    ///
    /// Fails when the definition lacks method/path metadata, routes a method
    /// other than GET/POST, or declares an invalid signature. A duplicate
    /// `(method, path)` pair replaces the earlier entry with a warning.
    pub fn register(&mut self, def: &RouteDef) -> Result<Arc<RouteEntry>, RegistrationError> {
        let method = def
            .method
            .clone()
            .ok_or_else(|| RegistrationError::MissingRouteMetadata(def.name.to_string()))?;
        let path = def
            .path
            .ok_or_else(|| RegistrationError::MissingRouteMetadata(def.name.to_string()))?;
        if method != Method::GET && method != Method::POST {
            return Err(RegistrationError::UnsupportedMethod {
                handler: def.name.to_string(),
                method: method.to_string(),
            });
        }
        let signature = Arc::new(HandlerSignature::derive(def.name, &def.signature)?);

        if let Some(pos) = self
            .routes
            .iter()
            .position(|(m, _, entry, _)| *m == method && entry.path_pattern == path)
        {
            let (_, _, old, _) = self.routes.remove(pos);
            warn!(
                method = %method,
                path = %path,
                old_handler = %old.handler_name,
                new_handler = %def.name,
                "Duplicate route registration - last one wins"
            );
        }

        let (regex, param_names) = Self::path_to_regex(path);
        let entry = Arc::new(RouteEntry {
            method: method.clone(),
            path_pattern: path.to_string(),
            handler_name: def.name.to_string(),
            signature,
        });

        info!(
            method = %method,
            path = %path,
            handler_name = %def.name,
            params = ?param_names,
            "Route registered"
        );

        self.routes
            .push((method, regex, entry.clone(), param_names));
        Ok(entry)
    }

    /// Match an HTTP request against the route table.
    ///
    /// Returns `None` when no route matches (a 404 for the caller).
    #[must_use]
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "Route match attempt");
        for (m, regex, entry, param_names) in &self.routes {
            if *m != method {
                continue;
            }
            if let Some(caps) = regex.captures(path) {
                let mut path_params = ParamVec::new();
                for (i, name) in param_names.iter().enumerate() {
                    if let Some(value) = caps.get(i + 1) {
                        path_params.push((name.clone(), value.as_str().to_string()));
                    }
                }
                info!(
                    method = %method,
                    path = %path,
                    handler_name = %entry.handler_name,
                    route_pattern = %entry.path_pattern,
                    path_params = ?path_params,
                    "Route matched"
                );
                return Some(RouteMatch {
                    entry: entry.clone(),
                    path_params,
                });
            }
        }
        warn!(method = %method, path = %path, "No route matched");
        None
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Convert a path pattern to a regex plus the ordered parameter names.
    ///
    /// `/users/{id}` becomes `^/users/([^/]+)$` with params `["id"]`.
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<Arc<str>>) {
        if path == "/" {
            return (
                Regex::new(r"^/$").expect("Failed to compile path regex"),
                Vec::new(),
            );
        }

        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names: Vec<Arc<str>> = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') {
                let name = segment.trim_start_matches('{').trim_end_matches('}');
                pattern.push_str("/([^/]+)");
                param_names.push(Arc::from(name));
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push('$');
        let regex = Regex::new(&pattern).expect("Failed to compile path regex");

        (regex, param_names)
    }
}
