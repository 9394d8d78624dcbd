//! Role based gate in front of named routes.
//!
//! The gate needs two request extensions set by earlier layers: an
//! [`AuthenticatedUser`] (absent means anonymous) and a [`RouteResult`]
//! (absent means the gate was mounted before routing, which is fatal).
//!
//! ```ignore
//! let router = Router::new().route("/pages/:id", get(view_page));
//! let router = middleware::apply(router, gate)
//!     .layer(from_fn_with_state(names, routing::resolve_route))
//!     .layer(from_fn(auth::authenticate));
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;

use crate::authz::{AccessQuery, AuthenticatedUser, Authorization};
use crate::config::AuthorizationConfig;
use crate::errors::{Error, Result};
use crate::response::ResponseFactory;
use crate::routing::RouteResult;

/// What to do with a matched route that has no name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnnamedRoutePolicy {
    /// Forward without asking the backend.
    #[default]
    Allow,
    /// Ask the backend with no resource.
    Check,
}

impl UnnamedRoutePolicy {
    pub fn from_allow(allow: bool) -> Self {
        if allow {
            Self::Allow
        } else {
            Self::Check
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Forward,
    Unauthorized,
    Forbidden,
}

#[derive(Clone)]
pub struct AuthorizationMiddleware {
    authorization: Arc<dyn Authorization>,
    response_factory: Arc<dyn ResponseFactory>,
    default_privilege: Option<Arc<str>>,
    unnamed_routes: UnnamedRoutePolicy,
}

impl fmt::Debug for AuthorizationMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationMiddleware")
            .field("default_privilege", &self.default_privilege)
            .field("unnamed_routes", &self.unnamed_routes)
            .finish_non_exhaustive()
    }
}

impl AuthorizationMiddleware {
    pub fn new(
        authorization: Arc<dyn Authorization>,
        response_factory: Arc<dyn ResponseFactory>,
        default_privilege: Option<String>,
    ) -> Self {
        Self {
            authorization,
            response_factory,
            default_privilege: default_privilege.map(Arc::from),
            unnamed_routes: UnnamedRoutePolicy::default(),
        }
    }

    pub fn from_config(
        authorization: Arc<dyn Authorization>,
        response_factory: Arc<dyn ResponseFactory>,
        config: AuthorizationConfig,
    ) -> Self {
        Self::new(authorization, response_factory, config.default_privilege)
            .with_unnamed_route_policy(UnnamedRoutePolicy::from_allow(config.allow_unnamed_routes))
    }

    pub fn with_unnamed_route_policy(mut self, policy: UnnamedRoutePolicy) -> Self {
        self.unnamed_routes = policy;
        self
    }

    pub fn default_privilege(&self) -> Option<&str> {
        self.default_privilege.as_deref()
    }

    pub fn unnamed_route_policy(&self) -> UnnamedRoutePolicy {
        self.unnamed_routes
    }

    /// Gate one request. `next` is called at most once, and only when access
    /// is granted or no access control applies to the route.
    pub async fn process<N, Fut>(&self, request: Request, next: N) -> Result<Response>
    where
        N: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        let (parts, body) = request.into_parts();

        match self.decide(&parts).await? {
            Outcome::Forward => Ok(next(Request::from_parts(parts, body)).await),
            Outcome::Unauthorized => self.respond(StatusCode::UNAUTHORIZED),
            Outcome::Forbidden => self.respond(StatusCode::FORBIDDEN),
        }
    }

    async fn decide(&self, parts: &Parts) -> Result<Outcome> {
        let Some(user) = parts.extensions.get::<AuthenticatedUser>() else {
            tracing::info!(uri = %parts.uri, "authorization denied: not authenticated");
            return Ok(Outcome::Unauthorized);
        };

        let Some(route) = parts.extensions.get::<RouteResult>() else {
            tracing::error!(uri = %parts.uri, "route result missing; authorization gate mounted before routing");
            return Err(Error::MissingRouteResult);
        };

        if route.is_failure() {
            tracing::debug!(uri = %parts.uri, "no matching route; access open");
            return Ok(Outcome::Forward);
        }

        let resource = route.matched_route_name();
        if resource.is_none() && self.unnamed_routes == UnnamedRoutePolicy::Allow {
            tracing::debug!(uri = %parts.uri, "unnamed route; access open");
            return Ok(Outcome::Forward);
        }

        if self.is_granted(user, resource, parts).await {
            Ok(Outcome::Forward)
        } else {
            tracing::info!(
                identity = %user.identity,
                resource = ?resource,
                privilege = ?self.default_privilege(),
                "authorization denied: no role granted"
            );
            Ok(Outcome::Forbidden)
        }
    }

    async fn is_granted(&self, user: &AuthenticatedUser, resource: Option<&str>, parts: &Parts) -> bool {
        let query = AccessQuery::new()
            .resource(resource)
            .privilege(self.default_privilege())
            .request(parts);

        if user.roles.is_empty() {
            let granted = self.authorization.is_granted(query.role(None)).await;
            if granted {
                tracing::debug!(
                    identity = %user.identity,
                    resource = ?resource,
                    "authorization granted without role"
                );
            }
            return granted;
        }

        for role in user.roles() {
            if self.authorization.is_granted(query.role(Some(role))).await {
                tracing::debug!(
                    identity = %user.identity,
                    role = %role,
                    resource = ?resource,
                    "authorization granted"
                );
                return true;
            }
        }

        false
    }

    fn respond(&self, status: StatusCode) -> Result<Response> {
        self.response_factory
            .create_response(status.as_u16(), "")
            .map_err(|source| Error::StatusCode { source })
    }
}

/// `from_fn_with_state` entry point.
pub async fn authorize(
    State(gate): State<AuthorizationMiddleware>,
    req: Request,
    next: Next,
) -> Result<Response> {
    gate.process(req, |req| next.run(req)).await
}

/// Put the authorization gate in front of every route of `router`.
pub fn apply<S>(router: Router<S>, gate: AuthorizationMiddleware) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gate, authorize))
}
