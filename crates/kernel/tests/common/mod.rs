#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] wraps the REAL kernel router and state over an in-memory
//! content store, so every test gets an isolated, empty store.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use lectern_kernel::content::{CategoryRegistry, ContentService, MemoryContentStore};
use lectern_kernel::middleware::TokenVerifier;
use lectern_kernel::permissions::Subject;
use lectern_kernel::state::AppState;

/// Secret shared by the test verifier and minted tokens.
pub const JWT_SECRET: &[u8] = b"lectern-integration-test-secret";

/// Category directory used by every test app.
pub const CATEGORIES: &str = r#"
[[category]]
slug = "slang-vocab"
name = "Slang & Vocabulary"
description = "Everyday words and phrases"

[[category]]
slug = "meme-culture"
name = "Meme Culture"
description = "Where the jokes come from"
"#;

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application over an empty in-memory store.
    pub fn new() -> Self {
        let categories = CategoryRegistry::from_toml(CATEGORIES).expect("valid categories");
        let state = AppState::from_parts(
            Arc::new(MemoryContentStore::new()),
            categories,
            TokenVerifier::new(JWT_SECRET, None),
        );
        let router = lectern_kernel::app(state.clone());
        Self { router, state }
    }

    /// The content service behind the router.
    pub fn content(&self) -> &ContentService {
        self.state.content()
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request and decode the JSON response body.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        subject: Option<&Subject>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(subject) = subject {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(subject)));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.request(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

/// Mint a bearer token for a subject.
pub fn token_for(subject: &Subject) -> String {
    lectern_test_utils::mint_token(JWT_SECRET, subject.id, subject.role.as_str()).unwrap()
}

/// A fresh contributor.
pub fn contributor() -> Subject {
    Subject::user(Uuid::now_v7())
}

/// A fresh admin.
pub fn admin() -> Subject {
    Subject::admin(Uuid::now_v7())
}

/// Read a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

/// Read a response body as JSON (`Null` when empty or not JSON).
pub async fn body_json(response: Response) -> Value {
    let text = body_string(response).await;
    serde_json::from_str(&text).unwrap_or(Value::Null)
}
