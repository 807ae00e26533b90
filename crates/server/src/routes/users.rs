//! Plain user route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::DataResponse;
use crate::error::{ApiJson, Result};
use crate::middleware::RequireUser;
use crate::models::{UserProfile, UserSession};
use crate::services::users::{RegisterUserInput, UserLoginInput};
use crate::state::AppState;

/// `POST /api/users/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterUserInput>,
) -> Result<(StatusCode, Json<DataResponse<UserSession>>)> {
    let (user, token) = state.users().register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(
            "User registered successfully",
            UserSession::new(user, token),
        )),
    ))
}

/// `POST /api/users/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserLoginInput>,
) -> Result<Json<DataResponse<UserSession>>> {
    let (user, token) = state.users().login(input).await?;
    Ok(Json(DataResponse::with_message(
        "Login successful",
        UserSession::new(user, token),
    )))
}

/// `GET /api/users/profile`
pub async fn profile(RequireUser(user): RequireUser) -> Json<DataResponse<UserProfile>> {
    Json(DataResponse::new(UserProfile::from(user)))
}
