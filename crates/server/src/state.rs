//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::MarketStore;
use crate::services::{
    CredentialError, Credentials, OwnerService, TokenIssuer, UniqueIdGenerator, UserService,
    random_unique_ids,
};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is built once at startup
/// and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn MarketStore>,
    credentials: Credentials,
    unique_ids: UniqueIdGenerator,
}

impl AppState {
    /// Create the application state with random login ID generation.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the password hashing parameters are invalid.
    pub fn new(config: ServerConfig, store: Arc<dyn MarketStore>) -> Result<Self, CredentialError> {
        Self::with_unique_ids(config, store, random_unique_ids())
    }

    /// Create the application state with a specific login ID source.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the password hashing parameters are invalid.
    pub fn with_unique_ids(
        config: ServerConfig,
        store: Arc<dyn MarketStore>,
        unique_ids: UniqueIdGenerator,
    ) -> Result<Self, CredentialError> {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_days);
        let credentials = Credentials::new(config.password, tokens)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                credentials,
                unique_ids,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// The configured store backend.
    #[must_use]
    pub fn store(&self) -> &dyn MarketStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Owner operations bound to this state.
    #[must_use]
    pub fn owners(&self) -> OwnerService<'_> {
        OwnerService::new(self.store(), self.credentials(), &self.inner.unique_ids)
    }

    /// User operations bound to this state.
    #[must_use]
    pub fn users(&self) -> UserService<'_> {
        UserService::new(self.store(), self.credentials())
    }
}
