//! Public catalog assembly.
//!
//! A product is publicly visible iff its own `is_live` flag is set AND its
//! shop is open. Visibility is derived on every read; it is never stored.

use serde::Deserialize;

use crate::db::MarketStore;
use crate::error::AppError;
use crate::models::{Product, PublicProduct, ShopOwner};

/// Category value the client sends to mean "no category filter".
const ALL_CATEGORIES: &str = "All";

/// Optional narrowing of the public listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    /// Case-insensitive match against product name or shop name.
    pub search: Option<String>,
    /// Exact category; `All` or absent means every category.
    pub category: Option<String>,
}

impl CatalogFilter {
    fn matches(&self, product: &PublicProduct) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                product.product_name.to_lowercase().contains(&term)
                    || product.shop_name.to_lowercase().contains(&term)
            }
        };

        let category_ok = match self.category.as_deref().map(str::trim) {
            None | Some("" | ALL_CATEGORIES) => true,
            Some(category) => product.category == category,
        };

        search_ok && category_ok
    }
}

/// Whether `product` of `owner` shows up in the public listing.
#[must_use]
pub const fn is_publicly_visible(owner: &ShopOwner, product: &Product) -> bool {
    owner.is_shop_open && product.is_live
}

/// Flatten every visible product, owners in the given order and products in
/// catalog order.
#[must_use]
pub fn visible_products(owners: &[ShopOwner]) -> Vec<PublicProduct> {
    owners
        .iter()
        .flat_map(|owner| {
            owner
                .products
                .iter()
                .filter(|product| is_publicly_visible(owner, product))
                .map(move |product| PublicProduct::new(owner, product))
        })
        .collect()
}

/// Build the public listing from the store.
///
/// # Errors
///
/// Returns `AppError::Database` if the store read fails.
pub async fn list_public_products(
    store: &dyn MarketStore,
    filter: &CatalogFilter,
) -> Result<Vec<PublicProduct>, AppError> {
    let owners = store.list_open_owners().await?;
    let mut products = visible_products(&owners);
    products.retain(|p| filter.matches(p));
    Ok(products)
}
