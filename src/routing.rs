//! Route-match results consumed by the authorization middleware.
//!
//! axum has no notion of route names, so [`RouteNames`] maps matched path
//! patterns to names and [`resolve_route`] stores the outcome as a
//! [`RouteResult`] request extension.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult {
    Matched { name: Option<String> },
    /// `allowed_methods` is set when the path matched but the method did not.
    Failure { allowed_methods: Option<Vec<Method>> },
}

impl RouteResult {
    pub fn from_route(name: impl Into<String>) -> Self {
        Self::Matched {
            name: Some(name.into()),
        }
    }

    pub fn unnamed() -> Self {
        Self::Matched { name: None }
    }

    pub fn from_failure(allowed_methods: Option<Vec<Method>>) -> Self {
        Self::Failure { allowed_methods }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn is_method_failure(&self) -> bool {
        matches!(
            self,
            Self::Failure {
                allowed_methods: Some(_)
            }
        )
    }

    /// `None` on failure or when the matched route has no name.
    pub fn matched_route_name(&self) -> Option<&str> {
        match self {
            Self::Matched { name } => name.as_deref(),
            Self::Failure { .. } => None,
        }
    }

    pub fn allowed_methods(&self) -> Option<&[Method]> {
        match self {
            Self::Failure {
                allowed_methods: Some(methods),
            } => Some(methods),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct NamedRoute {
    name: String,
    /// `None` accepts every method.
    methods: Option<Vec<Method>>,
}

/// Route names keyed by axum path pattern (`/pages/:id`).
#[derive(Debug, Clone, Default)]
pub struct RouteNames {
    routes: Arc<HashMap<String, NamedRoute>>,
}

impl RouteNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name a pattern for every method.
    pub fn name(self, pattern: impl Into<String>, name: impl Into<String>) -> Self {
        self.insert(pattern.into(), name.into(), None)
    }

    /// Name a pattern served only for `methods`. Other methods resolve to a
    /// method failure listing `methods`.
    pub fn name_with_methods<I>(self, pattern: impl Into<String>, methods: I, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.insert(pattern.into(), name.into(), Some(methods.into_iter().collect()))
    }

    fn insert(mut self, pattern: String, name: String, methods: Option<Vec<Method>>) -> Self {
        Arc::make_mut(&mut self.routes).insert(pattern, NamedRoute { name, methods });
        self
    }

    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.routes.get(pattern).map(|route| route.name.as_str())
    }

    pub fn resolve(&self, matched: Option<&MatchedPath>, method: &Method) -> RouteResult {
        let Some(path) = matched else {
            return RouteResult::from_failure(None);
        };
        let Some(route) = self.routes.get(path.as_str()) else {
            return RouteResult::unnamed();
        };

        match &route.methods {
            Some(methods) if !accepts(methods, method) => RouteResult::from_failure(Some(methods.clone())),
            _ => RouteResult::from_route(route.name.clone()),
        }
    }
}

// axum serves HEAD wherever GET is routed.
fn accepts(methods: &[Method], method: &Method) -> bool {
    methods.contains(method) || (*method == Method::HEAD && methods.contains(&Method::GET))
}

/// Middleware inserting a [`RouteResult`] for the request. Requests that reach
/// the fallback carry no `MatchedPath` and are recorded as failures.
pub async fn resolve_route(State(names): State<RouteNames>, mut req: Request, next: Next) -> Response {
    let result = names.resolve(req.extensions().get::<MatchedPath>(), req.method());
    tracing::trace!(route = ?result, "route resolved");
    req.extensions_mut().insert(result);
    next.run(req).await
}
