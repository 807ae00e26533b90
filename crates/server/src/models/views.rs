//! Outward JSON representations.
//!
//! None of these carry a password hash. Field names follow the browser
//! client's camelCase convention with `_id` for entity ids.

use chrono::{DateTime, Utc};
use serde::Serialize;

use nearu_core::{Email, OwnerId, Price, ProductId, Role, ShopType, UniqueId, UserId};

use super::{Product, ShopOwner, User};

/// Owner profile as returned by `GET /api/owners/profile`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    #[serde(rename = "_id")]
    pub id: OwnerId,
    pub username: String,
    pub email: Email,
    pub address: String,
    pub shop_type: ShopType,
    pub unique_id: UniqueId,
    pub role: Role,
    pub is_shop_open: bool,
    pub products: Vec<Product>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShopOwner> for OwnerProfile {
    fn from(owner: ShopOwner) -> Self {
        Self {
            id: owner.id,
            role: owner.role(),
            username: owner.username,
            email: owner.email,
            address: owner.address,
            shop_type: owner.shop_type,
            unique_id: owner.unique_id,
            is_shop_open: owner.is_shop_open,
            products: owner.products,
            created_at: owner.created_at,
            updated_at: owner.updated_at,
        }
    }
}

/// Owner summary plus a fresh bearer token, returned on register and login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSession {
    #[serde(rename = "_id")]
    pub id: OwnerId,
    pub username: String,
    pub email: Email,
    pub address: String,
    pub shop_type: ShopType,
    pub unique_id: UniqueId,
    pub role: Role,
    pub is_shop_open: bool,
    pub token: String,
}

impl OwnerSession {
    #[must_use]
    pub fn new(owner: ShopOwner, token: String) -> Self {
        Self {
            id: owner.id,
            role: owner.role(),
            username: owner.username,
            email: owner.email,
            address: owner.address,
            shop_type: owner.shop_type,
            unique_id: owner.unique_id,
            is_shop_open: owner.is_shop_open,
            token,
        }
    }
}

/// Plain user profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role: user.role(),
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// User summary plus a fresh bearer token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: Role,
    pub token: String,
}

impl UserSession {
    #[must_use]
    pub fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            role: user.role(),
            username: user.username,
            email: user.email,
            token,
        }
    }
}

/// A publicly visible product, flattened with its shop's details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProduct {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub product_name: String,
    pub product_price: Price,
    pub product_description: String,
    pub product_image: String,
    pub category: String,
    pub shop_name: String,
    pub shop_address: String,
    pub shop_type: ShopType,
    pub owner_id: OwnerId,
}

impl PublicProduct {
    /// Flatten `product` with the details of the shop that lists it.
    #[must_use]
    pub fn new(owner: &ShopOwner, product: &Product) -> Self {
        Self {
            id: product.id,
            product_name: product.product_name.clone(),
            product_price: product.product_price,
            product_description: product.product_description.clone(),
            product_image: product.product_image.clone(),
            category: product.category.clone(),
            shop_name: owner.username.clone(),
            shop_address: owner.address.clone(),
            shop_type: owner.shop_type,
            owner_id: owner.id,
        }
    }
}
