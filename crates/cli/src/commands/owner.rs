//! Shop owner management commands.
//!
//! # Usage
//!
//! ```bash
//! # Register a shop owner and print the login ID
//! nearu-cli owner register -u "Joe Mart" -e joe@x.com -p secret1 -a "12 Main St" -s Grocery
//!
//! # Show an owner's profile by login ID
//! nearu-cli owner show NEARU-GRO-7K2QF
//! ```
//!
//! # Environment Variables
//!
//! - `NEARU_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `NEARU_JWT_SECRET` - needed by `register`, which issues a token like the API does

use std::sync::Arc;

use nearu_core::{UniqueId, UniqueIdError};
use nearu_server::AppState;
use nearu_server::config::{ConfigError, ServerConfig, StoreBackend, database_url_from_env};
use nearu_server::db::{MarketStore, PgStore, RepositoryError, create_pool};
use nearu_server::error::AppError;
use nearu_server::models::OwnerProfile;
use nearu_server::services::CredentialError;
use nearu_server::services::owners::RegisterOwnerInput;
use thiserror::Error;

/// Errors that can occur during owner operations.
#[derive(Debug, Error)]
pub enum OwnerCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Owner commands need NEARU_STORE=postgres")]
    NotPostgres,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("Credential setup failed: {0}")]
    Credentials(#[from] CredentialError),

    /// Rejected by the same rules the API applies.
    #[error("{}", .0.message())]
    Rejected(#[from] AppError),

    #[error("Invalid login ID: {0}")]
    InvalidUniqueId(#[from] UniqueIdError),

    #[error("No owner with login ID {0}")]
    NotFound(String),

    #[error("Could not render profile: {0}")]
    Render(#[from] serde_json::Error),
}

/// Register a shop owner through the same service the API uses.
///
/// # Returns
///
/// The issued login ID.
pub async fn register(input: RegisterOwnerInput) -> Result<UniqueId, OwnerCommandError> {
    let config = ServerConfig::from_env()?;
    let StoreBackend::Postgres { database_url } = &config.store else {
        return Err(OwnerCommandError::NotPostgres);
    };

    tracing::info!("Connecting to database...");
    let pool = create_pool(database_url).await?;
    let store: Arc<dyn MarketStore> = Arc::new(PgStore::new(pool));

    let state = AppState::new(config, store)?;
    let (owner, _token) = state.owners().register(input).await?;

    tracing::info!(
        owner_id = %owner.id,
        shop_type = %owner.shop_type,
        "Shop owner registered"
    );
    Ok(owner.unique_id)
}

/// Render an owner's profile, products included, as pretty JSON.
pub async fn show(unique_id: &str) -> Result<String, OwnerCommandError> {
    let unique_id = UniqueId::parse(unique_id)?;
    let database_url = database_url_from_env()?;

    let pool = create_pool(&database_url).await?;
    let store = PgStore::new(pool);

    let owner = store
        .find_owner_by_unique_id(&unique_id)
        .await?
        .ok_or_else(|| OwnerCommandError::NotFound(unique_id.to_string()))?;

    Ok(serde_json::to_string_pretty(&OwnerProfile::from(owner))?)
}
