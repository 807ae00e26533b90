//! Plain end-user accounts.

use chrono::{DateTime, Utc};

use nearu_core::{Email, Role, UserId};

/// An end-user who browses the marketplace. Never owns products.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Users always carry the `user` role.
    #[must_use]
    pub const fn role(&self) -> Role {
        Role::User
    }
}

/// Fields for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Email,
    pub password_hash: String,
}
