use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;

/// One authorization question. Every dimension is optional and its meaning
/// when absent is left to the backend (a missing role usually means an
/// authenticated user without roles).
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessQuery<'a> {
    pub role: Option<&'a str>,
    pub resource: Option<&'a str>,
    pub privilege: Option<&'a str>,
    /// Head of the request being authorized, for backends that look at
    /// headers, the URI or extensions.
    pub request: Option<&'a Parts>,
}

impl<'a> AccessQuery<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: Option<&'a str>) -> Self {
        self.role = role;
        self
    }

    pub fn resource(mut self, resource: Option<&'a str>) -> Self {
        self.resource = resource;
        self
    }

    pub fn privilege(mut self, privilege: Option<&'a str>) -> Self {
        self.privilege = privilege;
        self
    }

    pub fn request(mut self, request: &'a Parts) -> Self {
        self.request = Some(request);
        self
    }
}

/// Pluggable authorization backend.
///
/// Implementations must deny by default: when a policy cannot be evaluated
/// the answer is `false`.
#[async_trait]
pub trait Authorization: Send + Sync {
    /// Check if the role is granted the privilege on the resource
    async fn is_granted(&self, query: AccessQuery<'_>) -> bool;
}

#[async_trait]
impl<T: Authorization + ?Sized> Authorization for Arc<T> {
    async fn is_granted(&self, query: AccessQuery<'_>) -> bool {
        (**self).is_granted(query).await
    }
}

#[async_trait]
impl<T: Authorization + ?Sized> Authorization for Box<T> {
    async fn is_granted(&self, query: AccessQuery<'_>) -> bool {
        (**self).is_granted(query).await
    }
}
