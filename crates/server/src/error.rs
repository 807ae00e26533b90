//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Failures render as
//! `{"success": false, "message": ...}`; server faults are logged and
//! captured to Sentry, and only debug builds echo the raw detail back as
//! `error`.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use nearu_core::Role;

use crate::db::RepositoryError;
use crate::services::credentials::CredentialError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// An account of this kind already uses the email.
    #[error("duplicate email for {0}")]
    DuplicateEmail(Role),

    /// Unknown login identifier or wrong password. Both render identically.
    #[error("invalid credentials for {0}")]
    InvalidCredentials(Role),

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid bearer token")]
    InvalidToken,

    /// The token was valid but its account no longer exists.
    #[error("token subject not found")]
    PrincipalNotFound,

    /// Authenticated, but with the wrong role for the route.
    #[error("forbidden: {0} role required")]
    Forbidden(Role),

    #[error("{0} not found")]
    NotFound(String),

    /// Every drawn login ID candidate was already taken.
    #[error("could not allocate a unique login ID")]
    ExhaustedIdSpace,

    #[error("Database error: {0}")]
    Database(RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::DuplicateEmail(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials(_)
            | Self::MissingToken
            | Self::InvalidToken
            | Self::PrincipalNotFound => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ExhaustedIdSpace | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::DuplicateEmail(Role::Owner) => "Owner already exists with this email".to_owned(),
            Self::DuplicateEmail(Role::User) => "User already exists with this email".to_owned(),
            Self::InvalidCredentials(Role::Owner) => "Invalid Unique ID or password".to_owned(),
            Self::InvalidCredentials(Role::User) => "Invalid email or password".to_owned(),
            Self::MissingToken => "Not authorized, no token".to_owned(),
            Self::InvalidToken => "Not authorized, token failed".to_owned(),
            Self::PrincipalNotFound => "User not found".to_owned(),
            Self::Forbidden(Role::Owner) => "Access denied. Owner only.".to_owned(),
            Self::Forbidden(Role::User) => "Access denied. User only.".to_owned(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::ExhaustedIdSpace | Self::Database(_) | Self::Internal(_) => {
                "Server error".to_owned()
            }
        }
    }

    const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::ExhaustedIdSpace | Self::Database(_) | Self::Internal(_)
        )
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => Self::NotFound(what.to_owned()),
            other => Self::Database(other),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidToken => Self::InvalidToken,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(error = %self, "Rejected request");
        }

        let mut body = json!({
            "success": false,
            "message": self.message(),
        });
        // Raw detail helps local debugging but must not leak from release builds.
        if cfg!(debug_assertions) && self.is_server_fault() {
            body["error"] = json!(self.to_string());
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body extractor that reports malformed input as a 400 validation error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation("x".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DuplicateEmail(Role::Owner).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidCredentials(Role::Owner).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::PrincipalNotFound.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden(Role::Owner).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::NotFound("Product".to_owned()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ExhaustedIdSpace.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err: AppError = RepositoryError::NotFound("Product").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Product not found");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_json(AppError::Forbidden(Role::Owner)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Access denied. Owner only.");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_server_fault_hides_detail_in_message() {
        let (status, body) = body_json(AppError::Internal("pool timed out".to_owned())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
    }
}
