#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;

use route_guard::errors::ResponseError;
use route_guard::{
    AccessQuery, AuthenticatedUser, Authorization, EmptyResponseFactory, ResponseFactory, RouteResult,
};

/// (role, resource, privilege) of one authorization query.
pub type Query = (Option<String>, Option<String>, Option<String>);

/// Authorization backend answering from a script and recording every query.
pub struct ScriptedAuthorization {
    answers: Vec<bool>,
    queries: Mutex<Vec<Query>>,
}

impl ScriptedAuthorization {
    pub fn new(answers: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            answers: answers.to_vec(),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authorization for ScriptedAuthorization {
    async fn is_granted(&self, query: AccessQuery<'_>) -> bool {
        let request = query.request.expect("request head is forwarded");
        assert_eq!(request.headers.get("x-trace").map(|v| v.as_bytes()), Some(&b"trace-42"[..]));

        let mut queries = self.queries.lock().unwrap();
        let answer = self.answers.get(queries.len()).copied().unwrap_or(false);
        queries.push((
            query.role.map(str::to_string),
            query.resource.map(str::to_string),
            query.privilege.map(str::to_string),
        ));
        answer
    }
}

pub fn q(role: Option<&str>, resource: &str, privilege: Option<&str>) -> Query {
    (
        role.map(str::to_string),
        Some(resource.to_string()),
        privilege.map(str::to_string),
    )
}

/// Downstream handler counting its invocations.
#[derive(Clone, Default)]
pub struct Downstream {
    calls: Arc<AtomicUsize>,
}

impl Downstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn handler(&self) -> impl FnOnce(Request) -> std::future::Ready<Response> {
        let calls = self.calls.clone();
        move |req: Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(
                req.headers().get("x-trace").map(|v| v.as_bytes()),
                Some(&b"trace-42"[..]),
                "handler must receive the original request"
            );
            std::future::ready(
                Response::builder()
                    .status(299)
                    .body(Body::from("downstream"))
                    .unwrap(),
            )
        }
    }
}

/// Empty-body response factory recording the statuses it was asked for.
#[derive(Default)]
pub struct CountingResponseFactory {
    statuses: Mutex<Vec<u16>>,
}

impl CountingResponseFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn statuses(&self) -> Vec<u16> {
        self.statuses.lock().unwrap().clone()
    }
}

impl ResponseFactory for CountingResponseFactory {
    fn create_response(&self, status: u16, reason: &str) -> Result<Response, ResponseError> {
        self.statuses.lock().unwrap().push(status);
        EmptyResponseFactory.create_response(status, reason)
    }
}

pub fn request(user: Option<AuthenticatedUser>, route: Option<RouteResult>) -> Request {
    let mut req = Request::builder()
        .uri("/pages/1")
        .header("x-trace", "trace-42")
        .body(Body::empty())
        .unwrap();
    if let Some(user) = user {
        req.extensions_mut().insert(user);
    }
    if let Some(route) = route {
        req.extensions_mut().insert(route);
    }
    req
}

pub fn user(roles: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser::new("alice").with_roles(roles.iter().copied())
}
