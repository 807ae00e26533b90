//! Plain user accounts: registration and email/password login.

use serde::Deserialize;

use nearu_core::{Email, Role};

use super::credentials::Credentials;
use super::owners::{MIN_PASSWORD_LENGTH, present, present_password};
use crate::db::{MarketStore, RepositoryError};
use crate::error::AppError;
use crate::models::{NewUser, User};

/// Body of `POST /api/users/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/users/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User-facing account operations.
pub struct UserService<'a> {
    store: &'a dyn MarketStore,
    credentials: &'a Credentials,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn MarketStore, credentials: &'a Credentials) -> Self {
        Self { store, credentials }
    }

    /// Register a new user and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for missing or malformed fields and
    /// `AppError::DuplicateEmail` if a user already uses the email.
    pub async fn register(&self, input: RegisterUserInput) -> Result<(User, String), AppError> {
        let (Some(username), Some(email), Some(password)) = (
            present(input.username.as_deref()),
            present(input.email.as_deref()),
            present_password(input.password.as_deref()),
        ) else {
            return Err(AppError::Validation("Please fill all fields".to_owned()));
        };

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let email = Email::parse(email)
            .map_err(|_| AppError::Validation("Please provide a valid email".to_owned()))?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail(Role::User));
        }

        let password_hash = self.credentials.hash_password(password.to_owned()).await?;
        let user = self
            .store
            .create_user(NewUser {
                username: username.to_owned(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::DuplicateEmail => AppError::DuplicateEmail(Role::User),
                other => other.into(),
            })?;

        let token = self.credentials.tokens().issue(user.id.into())?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok((user, token))
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a field is missing and
    /// `AppError::InvalidCredentials` if authentication fails.
    pub async fn login(&self, input: UserLoginInput) -> Result<(User, String), AppError> {
        let (Some(email), Some(password)) = (
            present(input.email.as_deref()),
            present_password(input.password.as_deref()),
        ) else {
            return Err(AppError::Validation(
                "Please provide email and password".to_owned(),
            ));
        };

        let user = match Email::parse(email) {
            Ok(email) => self.store.find_user_by_email(&email).await?,
            Err(_) => None,
        };

        let matches = self
            .credentials
            .check_login(
                password.to_owned(),
                user.as_ref().map(|u| u.password_hash.clone()),
            )
            .await?;
        let Some(user) = user.filter(|_| matches) else {
            return Err(AppError::InvalidCredentials(Role::User));
        };

        let token = self.credentials.tokens().issue(user.id.into())?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }
}
