//! Construction of [`AuthorizationMiddleware`] from a service lookup.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::authz::Authorization;
use crate::config::AuthorizationConfig;
use crate::errors::{Error, LookupError, Result};
use crate::middleware::AuthorizationMiddleware;
use crate::response::ResponseFactory;

const SERVICE: &str = "AuthorizationMiddleware";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    Authorization,
    ResponseFactory,
    Config,
}

impl Dependency {
    pub fn name(&self) -> &'static str {
        match self {
            Dependency::Authorization => "Authorization",
            Dependency::ResponseFactory => "ResponseFactory",
            Dependency::Config => "config",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dependency container the factory resolves its collaborators from.
pub trait ServiceLookup {
    fn has(&self, dependency: Dependency) -> bool;
    fn authorization(&self) -> std::result::Result<Arc<dyn Authorization>, LookupError>;
    fn response_factory(&self) -> std::result::Result<Arc<dyn ResponseFactory>, LookupError>;
    fn config(&self) -> std::result::Result<Value, LookupError>;
}

type Provider<T> = Box<dyn Fn() -> std::result::Result<T, LookupError> + Send + Sync>;

/// [`ServiceLookup`] backed by registered providers. Providers run on every
/// resolution.
#[derive(Default)]
pub struct ServiceRegistry {
    authorization: Option<Provider<Arc<dyn Authorization>>>,
    response_factory: Option<Provider<Arc<dyn ResponseFactory>>>,
    config: Option<Provider<Value>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorization(self, authorization: Arc<dyn Authorization>) -> Self {
        self.register_authorization(move || Ok(authorization.clone()))
    }

    pub fn register_authorization<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> std::result::Result<Arc<dyn Authorization>, LookupError> + Send + Sync + 'static,
    {
        self.authorization = Some(Box::new(provider));
        self
    }

    pub fn with_response_factory(mut self, factory: Arc<dyn ResponseFactory>) -> Self {
        self.response_factory = Some(Box::new(move || Ok::<_, LookupError>(factory.clone())));
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(Box::new(move || Ok::<_, LookupError>(config.clone())));
        self
    }
}

impl ServiceLookup for ServiceRegistry {
    fn has(&self, dependency: Dependency) -> bool {
        match dependency {
            Dependency::Authorization => self.authorization.is_some(),
            Dependency::ResponseFactory => self.response_factory.is_some(),
            Dependency::Config => self.config.is_some(),
        }
    }

    fn authorization(&self) -> std::result::Result<Arc<dyn Authorization>, LookupError> {
        let provider = self
            .authorization
            .as_ref()
            .ok_or(LookupError::NotFound(Dependency::Authorization.name()))?;
        provider()
    }

    fn response_factory(&self) -> std::result::Result<Arc<dyn ResponseFactory>, LookupError> {
        let provider = self
            .response_factory
            .as_ref()
            .ok_or(LookupError::NotFound(Dependency::ResponseFactory.name()))?;
        provider()
    }

    fn config(&self) -> std::result::Result<Value, LookupError> {
        let provider = self
            .config
            .as_ref()
            .ok_or(LookupError::NotFound(Dependency::Config.name()))?;
        provider()
    }
}

pub struct AuthorizationMiddlewareFactory;

impl AuthorizationMiddlewareFactory {
    pub fn create<L>(lookup: &L) -> Result<AuthorizationMiddleware>
    where
        L: ServiceLookup + ?Sized,
    {
        require(lookup, Dependency::Authorization)?;
        require(lookup, Dependency::ResponseFactory)?;

        let authorization = lookup
            .authorization()
            .map_err(|source| lookup_failed(Dependency::Authorization, source))?;
        let response_factory = lookup
            .response_factory()
            .map_err(|source| lookup_failed(Dependency::ResponseFactory, source))?;

        let config = if lookup.has(Dependency::Config) {
            let config = lookup
                .config()
                .map_err(|source| lookup_failed(Dependency::Config, source))?;
            AuthorizationConfig::from_value(&config)
        } else {
            AuthorizationConfig::default()
        };

        tracing::debug!(
            default_privilege = ?config.default_privilege,
            allow_unnamed_routes = config.allow_unnamed_routes,
            "authorization middleware created"
        );

        Ok(AuthorizationMiddleware::from_config(
            authorization,
            response_factory,
            config,
        ))
    }
}

fn require<L: ServiceLookup + ?Sized>(lookup: &L, dependency: Dependency) -> Result<()> {
    if lookup.has(dependency) {
        return Ok(());
    }
    Err(Error::MissingDependency {
        service: SERVICE,
        dependency: dependency.name(),
    })
}

fn lookup_failed(dependency: Dependency, source: LookupError) -> Error {
    Error::DependencyLookup {
        service: SERVICE,
        dependency: dependency.name(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::RbacAuthorization;
    use crate::middleware::UnnamedRoutePolicy;
    use crate::response::EmptyResponseFactory;
    use serde_json::json;

    #[test]
    fn registry_reports_registrations() {
        let registry = ServiceRegistry::new().with_response_factory(Arc::new(EmptyResponseFactory));

        assert!(registry.has(Dependency::ResponseFactory));
        assert!(!registry.has(Dependency::Authorization));
        assert!(matches!(
            registry.authorization(),
            Err(LookupError::NotFound("Authorization"))
        ));
    }

    #[test]
    fn reads_settings_from_config() {
        let registry = ServiceRegistry::new()
            .with_authorization(Arc::new(RbacAuthorization::new()))
            .with_response_factory(Arc::new(EmptyResponseFactory))
            .with_config(json!({
                "authorization": { "default_privilege": "write", "allow_unnamed_routes": false }
            }));

        let gate = AuthorizationMiddlewareFactory::create(&registry).unwrap();
        assert_eq!(gate.default_privilege(), Some("write"));
        assert_eq!(gate.unnamed_route_policy(), UnnamedRoutePolicy::Check);
    }

    #[test]
    fn config_is_optional() {
        let registry = ServiceRegistry::new()
            .with_authorization(Arc::new(RbacAuthorization::new()))
            .with_response_factory(Arc::new(EmptyResponseFactory));

        let gate = AuthorizationMiddlewareFactory::create(&registry).unwrap();
        assert_eq!(gate.default_privilege(), None);
        assert_eq!(gate.unnamed_route_policy(), UnnamedRoutePolicy::Allow);
    }
}
