//! Shop owner route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use nearu_core::ProductId;

use super::{DataResponse, ListResponse, MessageResponse};
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireOwner;
use crate::models::{OwnerProfile, OwnerSession, Product, PublicProduct};
use crate::services::owners::{
    AddProductInput, OwnerLoginInput, RegisterOwnerInput, UpdateProfileInput,
};
use crate::services::{CatalogFilter, list_public_products};
use crate::state::AppState;

/// Registration reply; `note` repeats the login ID for the user to keep.
#[derive(Debug, Serialize)]
pub struct RegisterOwnerResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: OwnerSession,
    pub note: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleShopResponse {
    pub success: bool,
    pub message: String,
    pub is_shop_open: bool,
}

/// Product ids that fail to parse cannot exist, so they read as missing.
fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Product".to_owned()))
}

/// `POST /api/owners/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterOwnerInput>,
) -> Result<(StatusCode, Json<RegisterOwnerResponse>)> {
    let (owner, token) = state.owners().register(input).await?;
    let note = format!(
        "Your Unique Login ID is: {} — Save this! You will login with this ID and your password.",
        owner.unique_id
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterOwnerResponse {
            success: true,
            message: "Shop Owner registered successfully",
            data: OwnerSession::new(owner, token),
            note,
        }),
    ))
}

/// `POST /api/owners/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<OwnerLoginInput>,
) -> Result<Json<DataResponse<OwnerSession>>> {
    let (owner, token) = state.owners().login(input).await?;
    Ok(Json(DataResponse::with_message(
        "Login successful",
        OwnerSession::new(owner, token),
    )))
}

/// `GET /api/owners/profile`
pub async fn profile(RequireOwner(owner): RequireOwner) -> Json<DataResponse<OwnerProfile>> {
    Json(DataResponse::new(OwnerProfile::from(owner)))
}

/// `PUT /api/owners/profile`
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    ApiJson(input): ApiJson<UpdateProfileInput>,
) -> Result<Json<DataResponse<OwnerProfile>>> {
    let updated = state.owners().update_profile(owner.id, input).await?;
    Ok(Json(DataResponse::with_message(
        "Profile updated successfully",
        OwnerProfile::from(updated),
    )))
}

/// `POST /api/owners/products`
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn add_product(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    ApiJson(input): ApiJson<AddProductInput>,
) -> Result<(StatusCode, Json<DataResponse<Product>>)> {
    let product = state.owners().add_product(owner.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message("Product added successfully", product)),
    ))
}

/// `PUT /api/owners/products/{product_id}/toggle`
#[instrument(skip_all, fields(owner_id = %owner.id, product_id = %product_id))]
pub async fn toggle_product(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    Path(product_id): Path<String>,
) -> Result<Json<DataResponse<Product>>> {
    let product_id = parse_product_id(&product_id)?;
    let product = state.owners().toggle_product(owner.id, product_id).await?;
    let status = if product.is_live { "LIVE" } else { "CLOSED" };

    Ok(Json(DataResponse::with_message(
        format!("Product is now {status}"),
        product,
    )))
}

/// `DELETE /api/owners/products/{product_id}`
#[instrument(skip_all, fields(owner_id = %owner.id, product_id = %product_id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    Path(product_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let product_id = parse_product_id(&product_id)?;
    state.owners().delete_product(owner.id, product_id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

/// `PUT /api/owners/toggle-shop`
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn toggle_shop(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
) -> Result<Json<ToggleShopResponse>> {
    let is_shop_open = state.owners().toggle_shop(owner.id).await?;
    let status = if is_shop_open { "OPEN" } else { "CLOSED" };

    Ok(Json(ToggleShopResponse {
        success: true,
        message: format!("Shop is now {status}"),
        is_shop_open,
    }))
}

/// `GET /api/owners/all-products`
///
/// Public. Only live products of open shops are listed.
#[instrument(skip(state))]
pub async fn all_products(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Result<Json<ListResponse<PublicProduct>>> {
    let products = list_public_products(state.store(), &filter).await?;
    Ok(Json(ListResponse::new(products)))
}

/// `GET /api/owners/my-products`
///
/// Every product of the caller, live or closed.
pub async fn my_products(RequireOwner(owner): RequireOwner) -> Json<ListResponse<Product>> {
    Json(ListResponse::new(owner.products))
}
