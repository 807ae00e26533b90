//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                                   - Banner
//! GET    /health                             - Liveness
//! GET    /health/ready                       - Readiness (store reachable)
//!
//! # Shop owners
//! POST   /api/owners/register                - Register, returns login ID + token
//! POST   /api/owners/login                   - Login with login ID + password
//! GET    /api/owners/profile                 - Own profile (owner)
//! PUT    /api/owners/profile                 - Update username/address (owner)
//! POST   /api/owners/products                - Add product (owner)
//! PUT    /api/owners/products/{id}/toggle    - Flip product live/closed (owner)
//! DELETE /api/owners/products/{id}           - Remove product (owner)
//! PUT    /api/owners/toggle-shop             - Flip shop open/closed (owner)
//! GET    /api/owners/all-products            - Public catalog (?search=&category=)
//! GET    /api/owners/my-products             - Own products, live or not (owner)
//!
//! # Users
//! POST   /api/users/register                 - Register
//! POST   /api/users/login                    - Login with email + password
//! GET    /api/users/profile                  - Own profile (user)
//! ```

pub mod health;
pub mod owners;
pub mod users;

use std::time::Duration;

use axum::{
    Router,
    http::{
        HeaderValue, Method, Request, Response,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn,
    routing::{MethodRouter, delete, get, post, put},
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiterLayer;
use crate::middleware::{
    ClientIpKeyExtractor, auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Success envelope carrying a single payload.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// Success envelope for listings.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    #[must_use]
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Success envelope with only a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Login and registration, optionally behind the per-IP rate limiter.
fn credential_routes(
    register: MethodRouter<AppState>,
    login: MethodRouter<AppState>,
    limiter: Option<RateLimiterLayer>,
) -> Router<AppState> {
    let router = Router::new()
        .route("/register", register)
        .route("/login", login);

    match limiter {
        Some(limiter) => router.layer(limiter),
        None => router,
    }
}

/// A fresh credential limiter when rate limiting is enabled.
fn credential_limiter(config: &ServerConfig) -> Option<RateLimiterLayer> {
    config.rate_limit.then(|| {
        auth_rate_limiter(if config.trusted_proxy {
            ClientIpKeyExtractor::behind_proxy()
        } else {
            ClientIpKeyExtractor::direct()
        })
    })
}

/// Routes under `/api/owners`.
pub fn owner_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .merge(credential_routes(
            post(owners::register),
            post(owners::login),
            limiter,
        ))
        .route(
            "/profile",
            get(owners::profile).put(owners::update_profile),
        )
        .route("/products", post(owners::add_product))
        .route(
            "/products/{product_id}/toggle",
            put(owners::toggle_product),
        )
        .route(
            "/products/{product_id}",
            delete(owners::delete_product),
        )
        .route("/toggle-shop", put(owners::toggle_shop))
        .route("/all-products", get(owners::all_products))
        .route("/my-products", get(owners::my_products))
}

/// Routes under `/api/users`.
pub fn user_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .merge(credential_routes(
            post(users::register),
            post(users::login),
            limiter,
        ))
        .route("/profile", get(users::profile))
}

/// CORS policy: the configured allow list, or permissive when none is set.
fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = origins else {
        return CorsLayer::permissive();
    };

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Build the full application with its middleware stack and state.
///
/// Sentry layers are added by the binary on top of this.
pub fn build_app(state: AppState) -> Router {
    let config = state.config();
    let owner_limiter = credential_limiter(config);
    let user_limiter = credential_limiter(config);
    let cors = cors_layer(config.cors_origins.as_deref());

    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/owners", owner_routes(owner_limiter))
        .nest("/api/users", user_routes(user_limiter))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}
