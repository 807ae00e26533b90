//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `NEARU_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `NEARU_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; only required with the `postgres` store)
//!
//! ## Optional
//! - `NEARU_STORE` - `postgres` (default) or `memory`
//! - `NEARU_HOST` - Bind address (default: 127.0.0.1)
//! - `NEARU_PORT` - Listen port (default: 5000)
//! - `NEARU_TOKEN_TTL_DAYS` - Bearer token lifetime in days (default: 30)
//! - `NEARU_PASSWORD_MEMORY_KIB` - Argon2 memory cost (default: 19456)
//! - `NEARU_PASSWORD_ITERATIONS` - Argon2 time cost (default: 2)
//! - `NEARU_CORS_ORIGINS` - Comma-separated allowed origins (default: any)
//! - `NEARU_RATE_LIMIT` - Rate limit the auth endpoints (default: true)
//! - `NEARU_TRUSTED_PROXY` - Key the rate limiter on `X-Forwarded-For` /
//!   `X-Real-IP` instead of the peer address (default: false)
//! - `NEARU_LOG_FORMAT` - `pretty` (default) or `json`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which [`MarketStore`](crate::db::MarketStore) backend to open.
#[derive(Clone)]
pub enum StoreBackend {
    Postgres { database_url: SecretString },
    Memory,
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
        }
    }
}

/// Application configuration.
///
/// Built once in `main` and handed to [`AppState`](crate::state::AppState).
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ServerConfig {
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token signing secret
    pub jwt_secret: SecretString,
    /// Bearer token lifetime in days
    pub token_ttl_days: u32,
    pub password: PasswordParams,
    /// Allowed CORS origins; `None` allows any origin
    pub cors_origins: Option<Vec<String>>,
    pub rate_limit: bool,
    /// Trust forwarding headers for the client IP; only behind a proxy
    pub trusted_proxy: bool,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("store", &self.store)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_days", &self.token_ttl_days)
            .field("password", &self.password)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit", &self.rate_limit)
            .field("trusted_proxy", &self.trusted_proxy)
            .field("log_format", &self.log_format)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = match get_env_or_default("NEARU_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: get_database_url("NEARU_DATABASE_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "NEARU_STORE".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let host = parse_env("NEARU_HOST", "127.0.0.1")?;
        let port = parse_env("NEARU_PORT", "5000")?;

        let jwt_secret = get_required_env("NEARU_JWT_SECRET")?;
        check_jwt_secret("NEARU_JWT_SECRET", &jwt_secret)?;
        let jwt_secret = SecretString::from(jwt_secret);

        let token_ttl_days: u32 = parse_env("NEARU_TOKEN_TTL_DAYS", "30")?;
        if token_ttl_days == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "NEARU_TOKEN_TTL_DAYS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let defaults = PasswordParams::default();
        let password = PasswordParams {
            memory_kib: parse_env(
                "NEARU_PASSWORD_MEMORY_KIB",
                &defaults.memory_kib.to_string(),
            )?,
            iterations: parse_env(
                "NEARU_PASSWORD_ITERATIONS",
                &defaults.iterations.to_string(),
            )?,
        };

        let cors_origins = get_optional_env("NEARU_CORS_ORIGINS").map(|v| parse_origins(&v));
        let rate_limit = parse_env("NEARU_RATE_LIMIT", "true")?;
        let trusted_proxy = parse_env("NEARU_TRUSTED_PROXY", "false")?;

        let log_format = match get_env_or_default("NEARU_LOG_FORMAT", "pretty").as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "NEARU_LOG_FORMAT".to_string(),
                    format!("expected 'pretty' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            store,
            host,
            port,
            jwt_secret,
            token_ttl_days,
            password,
            cors_origins,
            rate_limit,
            trusted_proxy,
            log_format,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for in-process tests: in-memory store, cheap hashing,
    /// no rate limiting.
    #[must_use]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            store: StoreBackend::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            jwt_secret: SecretString::from(jwt_secret.to_owned()),
            token_ttl_days: 30,
            password: PasswordParams {
                memory_kib: 64,
                iterations: 1,
            },
            cors_origins: None,
            rate_limit: false,
            trusted_proxy: false,
            log_format: LogFormat::Pretty,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read only the `PostgreSQL` URL (`NEARU_DATABASE_URL`, then `DATABASE_URL`).
///
/// Used by tooling that talks to the database without serving requests.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("NEARU_DATABASE_URL")
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Reject signing secrets that are short, look like a template value, or
/// are too repetitive to have come from a generator.
fn check_jwt_secret(key: &str, value: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| Err(ConfigError::InsecureSecret(key.to_owned(), reason));

    let length = value.chars().count();
    if length < MIN_JWT_SECRET_LENGTH {
        return insecure(format!(
            "must be at least {MIN_JWT_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return insecure(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = bits_per_char(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return insecure(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        ));
    }

    Ok(())
}

/// Shannon entropy of `s`, in bits per character.
#[allow(clippy::cast_precision_loss)]
fn bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    let mut total = 0_u32;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    counts
        .into_values()
        .map(|n| {
            let p = f64::from(n) / f64::from(total);
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GOOD_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q";

    #[test]
    fn entropy_of_uniform_and_repeated_strings() {
        assert!(bits_per_char("").abs() < f64::EPSILON);
        assert!(bits_per_char("aaaa").abs() < f64::EPSILON);
        assert!((bits_per_char("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn generated_secret_is_accepted() {
        assert!(check_jwt_secret("NEARU_JWT_SECRET", GOOD_SECRET).is_ok());
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = check_jwt_secret("NEARU_JWT_SECRET", "k9#Lm2$v").unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn template_secret_is_rejected() {
        let err =
            check_jwt_secret("NEARU_JWT_SECRET", "put-your-nearu-signing-key-in-here-now")
                .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(ref var, _) if var == "NEARU_JWT_SECRET"));
    }

    #[test]
    fn repetitive_secret_is_rejected() {
        let err = check_jwt_secret("NEARU_JWT_SECRET", &"nU".repeat(20)).unwrap_err();
        assert!(err.to_string().contains("entropy"));
    }

    #[test]
    fn test_parse_origins_trims_and_skips_empty() {
        assert_eq!(
            parse_origins(" http://localhost:5173, ,https://nearu.app "),
            vec!["http://localhost:5173", "https://nearu.app"]
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = ServerConfig::for_tests(GOOD_SECRET);
        config.store = StoreBackend::Postgres {
            database_url: SecretString::from("postgres://nearu:hunter2@db/nearu".to_owned()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("aB3$xY9"));
        assert!(debug.contains("[REDACTED]"));
    }
}
