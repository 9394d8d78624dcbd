use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Cannot create {service} service; dependency {dependency} is missing")]
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },
    #[error("Cannot create {service} service; dependency {dependency} could not be resolved")]
    DependencyLookup {
        service: &'static str,
        dependency: &'static str,
        #[source]
        source: LookupError,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("The RouteResult attribute is missing in the request; cannot perform authorization checks")]
    MissingRouteResult,
    #[error("could not set statuscode")]
    StatusCode {
        #[source]
        source: ResponseError,
    },
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Errors raised while wiring the middleware, as opposed to errors raised
    /// while serving a request.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingDependency { .. } | Error::DependencyLookup { .. } | Error::InvalidConfig(_)
        )
    }
}

/// Failure reported by a [`ServiceLookup`](crate::factory::ServiceLookup)
/// while resolving a registered dependency.
#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("service {0} is not registered")]
    NotFound(&'static str),
    #[error("service {name} could not be created: {message}")]
    Creation { name: &'static str, message: String },
}

impl LookupError {
    pub fn creation(name: &'static str, message: impl Into<String>) -> Self {
        Self::Creation {
            name,
            message: message.into(),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ResponseError {
    #[error("invalid status code {0}")]
    InvalidStatus(u16),
    #[error("response could not be built: {0}")]
    Build(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let error = match &self {
            Error::MissingDependency { .. } => "missing_dependency",
            Error::DependencyLookup { .. } => "dependency_lookup",
            Error::InvalidConfig(_) => "configuration",
            Error::MissingRouteResult => "missing_route_result",
            Error::StatusCode { .. } => "status_code",
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn missing_dependency_names_service_and_dependency() {
        let err = Error::MissingDependency {
            service: "AuthorizationMiddleware",
            dependency: "Authorization",
        };

        assert_eq!(
            err.to_string(),
            "Cannot create AuthorizationMiddleware service; dependency Authorization is missing"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn status_code_error_keeps_cause() {
        let err = Error::StatusCode {
            source: ResponseError::InvalidStatus(42),
        };

        assert_eq!(err.to_string(), "could not set statuscode");
        assert!(!err.is_configuration());
        let cause = err.source().map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("invalid status code 42"));
    }

    #[test]
    fn errors_render_as_internal_server_error() {
        let resp = Error::MissingRouteResult.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
