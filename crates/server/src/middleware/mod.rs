//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Security headers
//! 6. Rate limiting (governor, credential routes only)
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireOwner`], [`RequireUser`] and [`CurrentPrincipal`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{CurrentPrincipal, RequireOwner, RequireUser};
pub use rate_limit::{ClientIpKeyExtractor, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
