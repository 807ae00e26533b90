//! Core types for NearU.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod shop_type;
pub mod unique_id;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::Role;
pub use shop_type::{ShopType, ShopTypeError};
pub use unique_id::{UniqueId, UniqueIdError};
