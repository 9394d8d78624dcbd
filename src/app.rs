use std::sync::Arc;

use axum::extract::Path;
use axum::http::Method;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::authz::{Authorization, RbacAuthorization};
use crate::errors::{LookupError, Result};
use crate::factory::{AuthorizationMiddlewareFactory, ServiceRegistry};
use crate::middleware::{self, AuthorizationMiddleware};
use crate::response::EmptyResponseFactory;
use crate::routing::{self, RouteNames};

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page: String,
    pub action: &'static str,
}

pub fn route_names() -> RouteNames {
    RouteNames::new()
        .name_with_methods("/pages", [Method::GET], "pages.list")
        .name_with_methods("/pages/:id", [Method::GET], "pages.view")
        .name_with_methods("/pages/:id/edit", [Method::POST], "pages.edit")
        .name_with_methods("/pages/:id/delete", [Method::POST], "pages.delete")
        .name_with_methods("/public", [Method::GET], "public.page")
}

/// Registry wiring the RBAC backend and empty-body responses from a
/// configuration document.
pub fn registry(config: Value) -> ServiceRegistry {
    let rbac_config = config.clone();
    ServiceRegistry::new()
        .register_authorization(move || {
            RbacAuthorization::from_config(&rbac_config)
                .map(|rbac| Arc::new(rbac) as Arc<dyn Authorization>)
                .map_err(|err| LookupError::creation("Authorization", err.to_string()))
        })
        .with_response_factory(Arc::new(EmptyResponseFactory))
        .with_config(config)
}

pub fn create_app(config: Value) -> Result<Router> {
    let gate = AuthorizationMiddlewareFactory::create(&registry(config))?;
    Ok(router(gate))
}

/// Demo routes behind `gate`. `/health` is unnamed, the fallback has no
/// route at all and a wrong method is a routing failure, so all three skip
/// authorization under the default policy.
pub fn router(gate: AuthorizationMiddleware) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let routes = Router::new()
        .route("/health", get(health))
        .route("/public", get(public_page))
        .route("/pages", get(list_pages))
        .route("/pages/:id", get(view_page))
        .route("/pages/:id/edit", post(edit_page))
        .route("/pages/:id/delete", post(delete_page));

    middleware::apply(routes, gate)
        .layer(from_fn_with_state(route_names(), routing::resolve_route))
        .layer(from_fn(auth::authenticate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn public_page() -> &'static str {
    "public"
}

async fn list_pages() -> Json<Vec<&'static str>> {
    Json(vec!["home", "about"])
}

async fn view_page(Path(id): Path<String>) -> Json<PageResponse> {
    Json(PageResponse { page: id, action: "view" })
}

async fn edit_page(Path(id): Path<String>) -> Json<PageResponse> {
    Json(PageResponse { page: id, action: "edit" })
}

async fn delete_page(Path(id): Path<String>) -> Json<PageResponse> {
    Json(PageResponse { page: id, action: "delete" })
}
