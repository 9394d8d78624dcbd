use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;

use crate::errors::ResponseError;

/// Builds the terminal responses the middleware returns on its own (401 and 403).
pub trait ResponseFactory: Send + Sync {
    fn create_response(&self, status: u16, reason: &str) -> Result<Response, ResponseError>;
}

/// Reason phrase requested for a synthesized response. HTTP/2 has no reason
/// phrase on the wire, so it travels as a response extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(pub String);

/// Empty-body responses carrying only a status code.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResponseFactory;

impl ResponseFactory for EmptyResponseFactory {
    fn create_response(&self, status: u16, reason: &str) -> Result<Response, ResponseError> {
        let status = StatusCode::from_u16(status).map_err(|_| ResponseError::InvalidStatus(status))?;

        let mut response = Response::builder()
            .status(status)
            .body(Body::empty())
            .map_err(|err| ResponseError::Build(err.to_string()))?;

        if !reason.is_empty() {
            response
                .extensions_mut()
                .insert(ReasonPhrase(reason.to_string()));
        }

        Ok(response)
    }
}
