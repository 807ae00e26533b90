//! Persistence for shop owners, their products, and users.
//!
//! # Schema: `nearu`
//!
//! ## Tables
//!
//! - `shop_owner` - Owner accounts (unique `email`, unique `unique_id`)
//! - `shop_product` - Products, owned by exactly one `shop_owner`
//! - `app_user` - Plain end-user accounts (unique `email`)
//! - `account_identity` (view) - Every account id with its kind
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p nearu-cli -- migrate
//! ```
//!
//! Handlers never touch a backend directly: they go through the
//! [`MarketStore`] trait, which has a `PostgreSQL` implementation for
//! production and an in-memory one for tests and local demos.

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use nearu_core::{AccountId, Email, OwnerId, ProductId, UniqueId, UserId};

use crate::config::StoreBackend;
use crate::models::{
    NewOwner, NewProduct, NewUser, OwnerProfileUpdate, Principal, Product, ShopOwner, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An account of the same kind already uses this email.
    #[error("email already registered")]
    DuplicateEmail,

    /// Another owner already holds this login ID.
    #[error("login ID already taken")]
    DuplicateUniqueId,
}

/// Storage for the marketplace aggregates.
///
/// Every mutation is atomic with respect to concurrent requests: flag
/// toggles flip the stored value rather than writing back a value read
/// earlier, and product pushes never lose a sibling push.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Short name of the backend, for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Insert a new owner with an empty catalog and the shop open.
    ///
    /// Fails with `DuplicateEmail` or `DuplicateUniqueId` when the
    /// respective unique key is already taken.
    async fn create_owner(&self, owner: NewOwner) -> Result<ShopOwner, RepositoryError>;

    async fn find_owner_by_id(&self, id: OwnerId) -> Result<Option<ShopOwner>, RepositoryError>;

    async fn find_owner_by_email(&self, email: &Email)
    -> Result<Option<ShopOwner>, RepositoryError>;

    async fn find_owner_by_unique_id(
        &self,
        unique_id: &UniqueId,
    ) -> Result<Option<ShopOwner>, RepositoryError>;

    /// Whether any owner already holds this login ID.
    async fn unique_id_exists(&self, unique_id: &UniqueId) -> Result<bool, RepositoryError>;

    /// Apply a partial profile update and return the updated owner.
    async fn update_owner_profile(
        &self,
        id: OwnerId,
        update: OwnerProfileUpdate,
    ) -> Result<ShopOwner, RepositoryError>;

    /// Append a live product to the end of the owner's catalog.
    async fn push_product(
        &self,
        owner: OwnerId,
        product: NewProduct,
    ) -> Result<Product, RepositoryError>;

    /// Flip one product's `is_live` flag and return the product.
    async fn toggle_product(
        &self,
        owner: OwnerId,
        product: ProductId,
    ) -> Result<Product, RepositoryError>;

    /// Remove one product from the owner's catalog.
    async fn remove_product(&self, owner: OwnerId, product: ProductId)
    -> Result<(), RepositoryError>;

    /// Flip the owner's `is_shop_open` flag and return the new value.
    async fn toggle_shop(&self, owner: OwnerId) -> Result<bool, RepositoryError>;

    /// Every open owner with their full catalog, in registration order.
    async fn list_open_owners(&self) -> Result<Vec<ShopOwner>, RepositoryError>;

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Resolve a token subject to whichever account kind holds that id.
    async fn find_principal(&self, id: AccountId) -> Result<Option<Principal>, RepositoryError>;

    /// Cheap round trip proving the backend is reachable.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open the configured store backend.
///
/// # Errors
///
/// Returns `sqlx::Error` if the `PostgreSQL` pool cannot be created.
pub async fn connect(backend: &StoreBackend) -> Result<Arc<dyn MarketStore>, sqlx::Error> {
    match backend {
        StoreBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
