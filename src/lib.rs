pub mod app;
pub mod auth;
pub mod authz;
pub mod config;
pub mod errors;
pub mod factory;
pub mod middleware;
pub mod response;
pub mod routing;

pub use app::create_app;
pub use authz::{AccessQuery, AuthenticatedUser, Authorization, RbacAuthorization};
pub use errors::{Error, Result};
pub use factory::{AuthorizationMiddlewareFactory, Dependency, ServiceLookup, ServiceRegistry};
pub use middleware::{AuthorizationMiddleware, UnnamedRoutePolicy};
pub use response::{EmptyResponseFactory, ResponseFactory};
pub use routing::{RouteNames, RouteResult};
