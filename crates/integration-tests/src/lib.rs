//! Integration tests for the NearU API.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (in-memory store, no server needed)
//! cargo test -p nearu-integration-tests
//!
//! # Live tests against a running server
//! NEARU_BASE_URL=http://localhost:5000 cargo test -p nearu-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api` - Full router driven with `tower::ServiceExt::oneshot`
//! - `live` - HTTP over `reqwest` against a deployed server

#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use nearu_server::config::ServerConfig;
use nearu_server::db::MemoryStore;
use nearu_server::services::UniqueIdGenerator;
use nearu_server::{AppState, build_app};

/// Signing secret for in-process tests.
pub const TEST_JWT_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q";

/// Peer address attached to requests that do not set their own.
pub const DEFAULT_PEER: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    40000,
);

/// Largest response body the helpers will buffer.
const MAX_BODY: usize = 1024 * 1024;

/// Base URL for live tests (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("NEARU_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// A router over a fresh in-memory store.
pub struct TestApp {
    router: Router,
}

/// Status and parsed JSON body (or `Value::String` for plain text).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ServerConfig::for_tests(TEST_JWT_SECRET))
    }

    /// A router built from `config` over a fresh in-memory store.
    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        let state = AppState::new(config, Arc::new(MemoryStore::new()))
            .expect("Failed to build test state");
        Self {
            router: build_app(state),
        }
    }

    /// A router whose owner login IDs come from `unique_ids`.
    #[must_use]
    pub fn with_unique_ids(unique_ids: UniqueIdGenerator) -> Self {
        let state = AppState::with_unique_ids(
            ServerConfig::for_tests(TEST_JWT_SECRET),
            Arc::new(MemoryStore::new()),
            unique_ids,
        )
        .expect("Failed to build test state");
        Self {
            router: build_app(state),
        }
    }

    /// Send one request through the full middleware stack.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send_request(request).await
    }

    /// Send a prepared request. Requests without a `ConnectInfo` extension
    /// arrive from [`DEFAULT_PEER`].
    pub async fn send_request(&self, mut request: Request<Body>) -> TestResponse {
        if request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .is_none()
        {
            request.extensions_mut().insert(ConnectInfo(DEFAULT_PEER));
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), MAX_BODY)
            .await
            .expect("Failed to read response body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::PUT, uri, token, None).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Register an owner and return the response `data` object.
    pub async fn register_owner(&self, username: &str, email: &str, shop_type: &str) -> Value {
        let resp = self
            .post(
                "/api/owners/register",
                None,
                json!({
                    "username": username,
                    "email": email,
                    "password": "secret1",
                    "address": "12 Main St",
                    "shopType": shop_type,
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        resp.body["data"].clone()
    }

    /// Register a plain user and return its token.
    pub async fn register_user(&self, username: &str, email: &str) -> String {
        let resp = self
            .post(
                "/api/users/register",
                None,
                json!({ "username": username, "email": email, "password": "secret1" }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        token_of(&resp.body["data"])
    }

    /// Add a product and return the created record.
    pub async fn add_product(&self, token: &str, body: Value) -> Value {
        let resp = self.post("/api/owners/products", Some(token), body).await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        resp.body["data"].clone()
    }

    /// Names in the public catalog, in listing order.
    pub async fn public_names(&self, query: &str) -> Vec<String> {
        let resp = self
            .get(&format!("/api/owners/all-products{query}"), None)
            .await;
        assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
        names_of(&resp.body["data"])
    }
}

/// The `token` field of a session object.
#[must_use]
pub fn token_of(session: &Value) -> String {
    session["token"]
        .as_str()
        .expect("session has a token")
        .to_owned()
}

/// The `_id` field of a record.
#[must_use]
pub fn id_of(record: &Value) -> String {
    record["_id"].as_str().expect("record has an _id").to_owned()
}

/// `productName` of every element of a JSON array.
#[must_use]
pub fn names_of(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|p| p["productName"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
