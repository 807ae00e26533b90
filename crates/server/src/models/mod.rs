//! Domain models for the marketplace.

pub mod owner;
pub mod user;
pub mod views;

pub use owner::{DEFAULT_CATEGORY, NewOwner, NewProduct, OwnerProfileUpdate, Product, ShopOwner};
pub use user::{NewUser, User};
pub use views::{OwnerProfile, OwnerSession, PublicProduct, UserProfile, UserSession};

/// The account a bearer token resolved to.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    Owner(ShopOwner),
}

impl Principal {
    /// Role of the resolved account.
    #[must_use]
    pub const fn role(&self) -> nearu_core::Role {
        match self {
            Self::User(u) => u.role(),
            Self::Owner(o) => o.role(),
        }
    }
}
