//! Fixtures shared by unit tests: an in-memory store and a router wired to it.

mod memory_store;

pub use memory_store::MemoryStore;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{generate_jwt, Role};
use crate::config::{AppConfig, Environment};
use crate::database::Collection;
use crate::state::AppState;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(AppConfig::for_environment(Environment::Development), store.clone());
        let router = crate::app(state.clone());
        Self { store, state, router }
    }

    /// Seeds a verified user with `role` and returns its id and a token.
    pub fn user(&self, role: Role) -> (Uuid, String) {
        let id = Uuid::new_v4();
        self.store.seed(
            Collection::Users,
            json!({"id": id.to_string(), "email": format!("{}@example.com", id.simple()), "role": role.code(), "status": 1, "verified": true}),
        );
        let token = generate_jwt(&self.state.config.security, id, role).expect("sign test token");
        (id, token)
    }

    /// Sends one request and returns the status and the JSON body.
    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("x-access-token", token);
        }
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).expect("build request"))
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }
}
