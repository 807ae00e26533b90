//! Bearer token authentication extractors.
//!
//! Resolution runs in a fixed order and stops at the first failure:
//! missing header or prefix (`MissingToken`), bad token (`InvalidToken`),
//! no account with that id (`PrincipalNotFound`), wrong role (`Forbidden`).

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use nearu_core::Role;

use crate::error::AppError;
use crate::models::{Principal, ShopOwner, User};
use crate::state::AppState;

/// Extract the raw token from `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingToken)
}

/// Any authenticated account.
///
/// # Example
///
/// ```rust,ignore
/// async fn whoami(CurrentPrincipal(principal): CurrentPrincipal) -> String {
///     principal.role().to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let account = state.credentials().tokens().verify(token)?;

        let principal = state
            .store()
            .find_principal(account)
            .await?
            .ok_or(AppError::PrincipalNotFound)?;

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(account.to_string()),
                ..Default::default()
            }));
        });
        tracing::debug!(account_id = %account, role = %principal.role(), "Bearer token accepted");

        Ok(Self(principal))
    }
}

/// An authenticated shop owner; any other principal is rejected with 403.
#[derive(Debug, Clone)]
pub struct RequireOwner(pub ShopOwner);

impl FromRequestParts<AppState> for RequireOwner {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match CurrentPrincipal::from_request_parts(parts, state).await?.0 {
            Principal::Owner(owner) => Ok(Self(owner)),
            Principal::User(_) => Err(AppError::Forbidden(Role::Owner)),
        }
    }
}

/// An authenticated plain user; owners are rejected with 403.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match CurrentPrincipal::from_request_parts(parts, state).await?.0 {
            Principal::User(user) => Ok(Self(user)),
            Principal::Owner(_) => Err(AppError::Forbidden(Role::User)),
        }
    }
}
