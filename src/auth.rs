//! Header based authenticator for development and tests.
//!
//! Trusts `x-user-id` and `x-user-roles` (comma separated) as sent by the
//! client. Real deployments replace this layer with one that verifies
//! credentials and stores the same [`AuthenticatedUser`] extension.

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::authz::AuthenticatedUser;

pub const USER_HEADER: &str = "x-user-id";
pub const ROLES_HEADER: &str = "x-user-roles";

pub fn user_from_headers(headers: &HeaderMap) -> Option<AuthenticatedUser> {
    let identity = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())?;

    let roles = headers
        .get(ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Some(AuthenticatedUser::new(identity).with_roles(roles))
}

pub async fn authenticate(mut req: Request, next: Next) -> Response {
    if let Some(user) = user_from_headers(req.headers()) {
        tracing::debug!(identity = %user.identity, roles = ?user.roles, "request authenticated");
        req.extensions_mut().insert(user);
    }
    next.run(req).await
}
