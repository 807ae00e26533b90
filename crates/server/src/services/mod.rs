//! Business logic.
//!
//! # Services
//!
//! - `credentials` - Argon2 password hashing and HS256 bearer tokens
//! - `owners` - Shop owner registration, login, and catalog edits
//! - `users` - Plain user registration and login
//! - `catalog` - Public product listing and its visibility rules
//!
//! Services borrow from [`AppState`](crate::state::AppState) and are built
//! per request.

pub mod catalog;
pub mod credentials;
pub mod owners;
pub mod users;

pub use catalog::{CatalogFilter, list_public_products, visible_products};
pub use credentials::{CredentialError, Credentials, TokenIssuer};
pub use owners::{OwnerService, UniqueIdGenerator, random_unique_ids};
pub use users::UserService;
