//! Shop owner aggregate and its embedded products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use nearu_core::{Email, OwnerId, Price, ProductId, Role, ShopType, UniqueId};

/// Category assigned to products added without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// A shop owner (aggregate root).
///
/// Owns its product catalog exclusively; products are only ever reached
/// through their owner. Not `Serialize` on purpose: the password hash must
/// never leave the server, so routes build explicit response types.
#[derive(Debug, Clone)]
pub struct ShopOwner {
    pub id: OwnerId,
    /// Display name, doubles as the public shop name.
    pub username: String,
    pub email: Email,
    pub password_hash: String,
    pub address: String,
    pub shop_type: ShopType,
    /// Login identifier handed to the owner at registration.
    pub unique_id: UniqueId,
    /// Gates the visibility of every product below.
    pub is_shop_open: bool,
    /// Products in insertion order.
    pub products: Vec<Product>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShopOwner {
    /// Owners always carry the `owner` role.
    #[must_use]
    pub const fn role(&self) -> Role {
        Role::Owner
    }
}

/// A product listed by a shop owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub product_name: String,
    pub product_price: Price,
    pub product_description: String,
    pub product_image: String,
    pub category: String,
    /// The owner's per-product visibility flag.
    pub is_live: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a shop owner. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewOwner {
    pub username: String,
    pub email: Email,
    pub password_hash: String,
    pub address: String,
    pub shop_type: ShopType,
    pub unique_id: UniqueId,
}

/// Fields for appending a product. New products are always live.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_name: String,
    pub product_price: Price,
    pub product_description: String,
    pub product_image: String,
    pub category: String,
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct OwnerProfileUpdate {
    pub username: Option<String>,
    pub address: Option<String>,
}

impl OwnerProfileUpdate {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.address.is_none()
    }
}
