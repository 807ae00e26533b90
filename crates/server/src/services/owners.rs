//! Shop owner operations: registration, login, profile and catalog edits.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use nearu_core::{Email, OwnerId, Price, ProductId, Role, ShopType, ShopTypeError, UniqueId};

use super::credentials::Credentials;
use crate::db::{MarketStore, RepositoryError};
use crate::error::AppError;
use crate::models::{
    DEFAULT_CATEGORY, NewOwner, NewProduct, OwnerProfileUpdate, Product, ShopOwner,
};

/// Upper bound on login ID candidates drawn for one registration.
pub const MAX_UNIQUE_ID_ATTEMPTS: usize = 16;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Source of login ID candidates. Swappable so tests can force collisions.
pub type UniqueIdGenerator = Arc<dyn Fn(ShopType) -> UniqueId + Send + Sync>;

/// Generator drawing suffixes from the thread-local RNG.
#[must_use]
pub fn random_unique_ids() -> UniqueIdGenerator {
    Arc::new(|shop_type| UniqueId::generate(shop_type, &mut rand::rng()))
}

/// Body of `POST /api/owners/register`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOwnerInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub shop_type: Option<String>,
}

/// Body of `POST /api/owners/login`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerLoginInput {
    pub unique_id: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/owners/products`.
///
/// `product_price` accepts a JSON number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductInput {
    pub product_name: Option<String>,
    pub product_price: Option<Value>,
    pub product_description: Option<String>,
    pub product_image: Option<String>,
    pub category: Option<String>,
}

/// Body of `PUT /api/owners/profile`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    pub username: Option<String>,
    pub address: Option<String>,
}

/// Trimmed, non-empty text or `None`.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Password as typed, if non-empty. Passwords are never trimmed.
pub(crate) fn present_password(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Parse a product price from a JSON number or numeric string.
///
/// Values a `Decimal` cannot hold are rejected rather than rounded, so a tiny
/// non-zero input never becomes a free product.
fn parse_price(raw: Option<&Value>) -> Result<Option<Price>, AppError> {
    let not_a_number = || AppError::Validation("Product price must be a number".to_owned());
    let out_of_range = || AppError::Validation("Product price is out of range".to_owned());

    let text = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(_) => return Err(not_a_number()),
    };

    let amount = match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(amount) => amount,
        Err(_) if text.parse::<f64>().is_ok_and(f64::is_finite) => return Err(out_of_range()),
        Err(_) => return Err(not_a_number()),
    };

    let mantissa = text.split(['e', 'E']).next().unwrap_or_default();
    if amount.is_zero() && mantissa.chars().any(|c| matches!(c, '1'..='9')) {
        return Err(out_of_range());
    }

    Price::new(amount)
        .map(Some)
        .map_err(|_| AppError::Validation("Product price cannot be negative".to_owned()))
}

/// Owner-facing operations.
///
/// Built per request from the shared [`AppState`](crate::state::AppState).
pub struct OwnerService<'a> {
    store: &'a dyn MarketStore,
    credentials: &'a Credentials,
    unique_ids: &'a UniqueIdGenerator,
}

impl<'a> OwnerService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn MarketStore,
        credentials: &'a Credentials,
        unique_ids: &'a UniqueIdGenerator,
    ) -> Self {
        Self {
            store,
            credentials,
            unique_ids,
        }
    }

    /// Register a new shop owner and issue a token.
    ///
    /// Login ID candidates are drawn until one is free, at most
    /// [`MAX_UNIQUE_ID_ATTEMPTS`] times. The store's unique key is the final
    /// authority; the pre-check only avoids a wasted insert.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for missing or malformed fields,
    /// `AppError::DuplicateEmail` if an owner already uses the email, and
    /// `AppError::ExhaustedIdSpace` if no free login ID was found.
    pub async fn register(
        &self,
        input: RegisterOwnerInput,
    ) -> Result<(ShopOwner, String), AppError> {
        let (Some(username), Some(email), Some(password), Some(address), Some(shop_type)) = (
            present(input.username.as_deref()),
            present(input.email.as_deref()),
            present_password(input.password.as_deref()),
            present(input.address.as_deref()),
            present(input.shop_type.as_deref()),
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
        let shop_type: ShopType = shop_type
            .parse()
            .map_err(|e: ShopTypeError| AppError::Validation(format!("Invalid shop type: {}", e.0)))?;

        if self.store.find_owner_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail(Role::Owner));
        }

        let password_hash = self.credentials.hash_password(password.to_owned()).await?;

        for attempt in 1..=MAX_UNIQUE_ID_ATTEMPTS {
            let unique_id = (self.unique_ids)(shop_type);
            if self.store.unique_id_exists(&unique_id).await? {
                tracing::debug!(attempt, %unique_id, "Login ID collision on pre-check");
                continue;
            }

            let new_owner = NewOwner {
                username: username.to_owned(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                address: address.to_owned(),
                shop_type,
                unique_id,
            };

            match self.store.create_owner(new_owner).await {
                Ok(owner) => {
                    let token = self.credentials.tokens().issue(owner.id.into())?;
                    tracing::info!(
                        owner_id = %owner.id,
                        unique_id = %owner.unique_id,
                        shop_type = %owner.shop_type,
                        "Shop owner registered"
                    );
                    return Ok((owner, token));
                }
                Err(RepositoryError::DuplicateUniqueId) => {
                    tracing::debug!(attempt, "Login ID collision on insert");
                }
                Err(RepositoryError::DuplicateEmail) => {
                    return Err(AppError::DuplicateEmail(Role::Owner));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::ExhaustedIdSpace)
    }

    /// Authenticate with login ID and password.
    ///
    /// An unknown login ID and a wrong password fail identically, and both
    /// pay for one Argon2 verification.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a field is missing and
    /// `AppError::InvalidCredentials` if authentication fails.
    pub async fn login(&self, input: OwnerLoginInput) -> Result<(ShopOwner, String), AppError> {
        let (Some(unique_id), Some(password)) = (
            present(input.unique_id.as_deref()),
            present_password(input.password.as_deref()),
        ) else {
            return Err(AppError::Validation(
                "Please provide Unique ID and password".to_owned(),
            ));
        };

        let owner = match UniqueId::parse(unique_id) {
            Ok(unique_id) => self.store.find_owner_by_unique_id(&unique_id).await?,
            Err(_) => None,
        };

        let matches = self
            .credentials
            .check_login(
                password.to_owned(),
                owner.as_ref().map(|o| o.password_hash.clone()),
            )
            .await?;
        let Some(owner) = owner.filter(|_| matches) else {
            return Err(AppError::InvalidCredentials(Role::Owner));
        };

        let token = self.credentials.tokens().issue(owner.id.into())?;
        tracing::info!(owner_id = %owner.id, "Shop owner logged in");
        Ok((owner, token))
    }

    /// Change the owner's display name and/or address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for empty or absent fields and
    /// `AppError::NotFound` if the owner no longer exists.
    pub async fn update_profile(
        &self,
        owner: OwnerId,
        input: UpdateProfileInput,
    ) -> Result<ShopOwner, AppError> {
        let mut update = OwnerProfileUpdate::default();
        if let Some(username) = input.username {
            update.username = Some(
                present(Some(username.as_str()))
                    .ok_or_else(|| AppError::Validation("Username cannot be empty".to_owned()))?
                    .to_owned(),
            );
        }
        if let Some(address) = input.address {
            update.address = Some(
                present(Some(address.as_str()))
                    .ok_or_else(|| AppError::Validation("Address cannot be empty".to_owned()))?
                    .to_owned(),
            );
        }
        if update.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_owned()));
        }

        Ok(self.store.update_owner_profile(owner, update).await?)
    }

    /// Append a product to the owner's catalog. New products start live.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the name or price is missing or
    /// the price is not a non-negative number, and `AppError::NotFound` if
    /// the owner no longer exists.
    pub async fn add_product(
        &self,
        owner: OwnerId,
        input: AddProductInput,
    ) -> Result<Product, AppError> {
        let name = present(input.product_name.as_deref());
        let price = parse_price(input.product_price.as_ref())?;
        let (Some(name), Some(price)) = (name, price) else {
            return Err(AppError::Validation(
                "Product name and price are required".to_owned(),
            ));
        };

        let new_product = NewProduct {
            product_name: name.to_owned(),
            product_price: price,
            product_description: input.product_description.unwrap_or_default(),
            product_image: input.product_image.unwrap_or_default(),
            category: present(input.category.as_deref())
                .unwrap_or(DEFAULT_CATEGORY)
                .to_owned(),
        };

        let product = self.store.push_product(owner, new_product).await?;
        tracing::info!(owner_id = %owner, product_id = %product.id, "Product added");
        Ok(product)
    }

    /// Flip a product between live and closed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the owner or the product is missing.
    pub async fn toggle_product(
        &self,
        owner: OwnerId,
        product: ProductId,
    ) -> Result<Product, AppError> {
        let product = self.store.toggle_product(owner, product).await?;
        tracing::info!(
            owner_id = %owner,
            product_id = %product.id,
            is_live = product.is_live,
            "Product toggled"
        );
        Ok(product)
    }

    /// Permanently remove a product from the owner's catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the owner or the product is missing.
    pub async fn delete_product(&self, owner: OwnerId, product: ProductId) -> Result<(), AppError> {
        self.store.remove_product(owner, product).await?;
        tracing::info!(owner_id = %owner, product_id = %product, "Product deleted");
        Ok(())
    }

    /// Flip the shop between open and closed; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the owner is missing.
    pub async fn toggle_shop(&self, owner: OwnerId) -> Result<bool, AppError> {
        let is_open = self.store.toggle_shop(owner).await?;
        tracing::info!(owner_id = %owner, is_shop_open = is_open, "Shop toggled");
        Ok(is_open)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use secrecy::SecretString;

    use super::*;
    use crate::config::PasswordParams;
    use crate::db::MemoryStore;
    use crate::services::credentials::TokenIssuer;

    fn credentials() -> Credentials {
        let tokens = TokenIssuer::new(
            &SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q".to_owned()),
            30,
        );
        Credentials::new(
            PasswordParams {
                memory_kib: 64,
                iterations: 1,
            },
            tokens,
        )
        .unwrap()
    }

    fn joe() -> RegisterOwnerInput {
        RegisterOwnerInput {
            username: Some("Joe Mart".to_owned()),
            email: Some("joe@x.com".to_owned()),
            password: Some("secret1".to_owned()),
            address: Some("12 Main St".to_owned()),
            shop_type: Some("Grocery".to_owned()),
        }
    }

    /// Generator that replays a fixed list, repeating the last entry.
    fn scripted(ids: &[&str]) -> UniqueIdGenerator {
        let ids: Vec<UniqueId> = ids.iter().map(|s| UniqueId::parse(s).unwrap()).collect();
        let next = AtomicUsize::new(0);
        Arc::new(move |_| {
            let i = next.fetch_add(1, Ordering::SeqCst).min(ids.len() - 1);
            ids[i].clone()
        })
    }

    #[tokio::test]
    async fn test_register_issues_prefixed_unique_id() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);

        let (owner, token) = service.register(joe()).await.unwrap();
        assert!(owner.unique_id.as_str().starts_with("NEARU-GRO-"));
        assert!(owner.is_shop_open);
        assert_eq!(creds.tokens().verify(&token).unwrap(), owner.id.into());
    }

    #[tokio::test]
    async fn test_register_missing_field() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);

        let mut input = joe();
        input.address = Some("   ".to_owned());
        let err = service.register(input).await.unwrap_err();
        assert_eq!(err.message(), "Please fill all fields");
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);

        let mut input = joe();
        input.password = Some("abc12".to_owned());
        let err = service.register(input).await.unwrap_err();
        assert_eq!(err.message(), "Password must be at least 6 characters");
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_shop_type() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);

        let mut input = joe();
        input.shop_type = Some("Bakery".to_owned());
        assert!(matches!(
            service.register(input).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);

        service.register(joe()).await.unwrap();
        let mut again = joe();
        again.email = Some(" JOE@x.com".to_owned());
        let err = service.register(again).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(Role::Owner)));
        assert_eq!(store.list_open_owners().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_retries_on_collision() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = scripted(&["NEARU-GRO-AAAAA", "NEARU-GRO-AAAAA", "NEARU-GRO-BBBBB"]);
        let service = OwnerService::new(&store, &creds, &ids);

        let (first, _) = service.register(joe()).await.unwrap();
        let mut second = joe();
        second.email = Some("ann@x.com".to_owned());
        let (second, _) = service.register(second).await.unwrap();

        assert_eq!(first.unique_id.as_str(), "NEARU-GRO-AAAAA");
        assert_eq!(second.unique_id.as_str(), "NEARU-GRO-BBBBB");
    }

    #[tokio::test]
    async fn test_register_gives_up_after_bounded_attempts() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = scripted(&["NEARU-GRO-AAAAA"]);
        let service = OwnerService::new(&store, &creds, &ids);

        service.register(joe()).await.unwrap();
        let mut second = joe();
        second.email = Some("ann@x.com".to_owned());
        assert!(matches!(
            service.register(second).await.unwrap_err(),
            AppError::ExhaustedIdSpace
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);
        let (owner, _) = service.register(joe()).await.unwrap();

        let wrong_password = service
            .login(OwnerLoginInput {
                unique_id: Some(owner.unique_id.to_string()),
                password: Some("secret2".to_owned()),
            })
            .await
            .unwrap_err();
        let unknown_id = service
            .login(OwnerLoginInput {
                unique_id: Some("NEARU-GRO-ZZZZZ".to_owned()),
                password: Some("secret1".to_owned()),
            })
            .await
            .unwrap_err();
        let garbage_id = service
            .login(OwnerLoginInput {
                unique_id: Some("joe@x.com".to_owned()),
                password: Some("secret1".to_owned()),
            })
            .await
            .unwrap_err();

        for err in [&wrong_password, &unknown_id, &garbage_id] {
            assert_eq!(err.status(), wrong_password.status());
            assert_eq!(err.message(), "Invalid Unique ID or password");
        }
    }

    #[tokio::test]
    async fn test_login_success() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);
        let (owner, _) = service.register(joe()).await.unwrap();

        let (logged_in, _) = service
            .login(OwnerLoginInput {
                unique_id: Some(owner.unique_id.to_string()),
                password: Some("secret1".to_owned()),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, owner.id);
    }

    #[test]
    fn test_parse_price_accepts_numbers_and_numeric_strings() {
        let p = parse_price(Some(&serde_json::json!(40))).unwrap().unwrap();
        assert_eq!(p.amount(), Decimal::new(40, 0));
        let p = parse_price(Some(&serde_json::json!("12.50"))).unwrap().unwrap();
        assert_eq!(p.amount(), Decimal::new(1250, 2));
        let p = parse_price(Some(&serde_json::json!(0))).unwrap().unwrap();
        assert!(p.amount().is_zero());
    }

    #[test]
    fn test_parse_price_rejects_unrepresentable_magnitudes() {
        let message = |raw: serde_json::Value| match parse_price(Some(&raw)) {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected a validation error for {raw}, got {other:?}"),
        };

        assert_eq!(message(serde_json::json!(1e300)), "Product price is out of range");
        assert_eq!(
            message(serde_json::json!("79228162514264337593543950336")),
            "Product price is out of range"
        );
        assert_eq!(
            message(serde_json::json!("0.0000000000000000000000000000001")),
            "Product price is out of range"
        );
        assert_eq!(message(serde_json::json!("1e-31")), "Product price is out of range");
        assert_eq!(message(serde_json::json!("inf")), "Product price must be a number");
    }

    #[test]
    fn test_parse_price_keeps_spelled_out_zero() {
        for raw in ["0", "0.00", "-0"] {
            let price = parse_price(Some(&serde_json::json!(raw))).unwrap().unwrap();
            assert!(price.amount().is_zero(), "{raw}");
        }
    }

    #[test]
    fn test_parse_price_rejects_bad_input() {
        assert!(parse_price(None).unwrap().is_none());
        assert!(parse_price(Some(&serde_json::json!(""))).unwrap().is_none());
        assert!(parse_price(Some(&serde_json::json!(-1))).is_err());
        assert!(parse_price(Some(&serde_json::json!("forty"))).is_err());
        assert!(parse_price(Some(&serde_json::json!(true))).is_err());
    }

    #[tokio::test]
    async fn test_add_product_defaults_and_toggle_twice() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);
        let (owner, _) = service.register(joe()).await.unwrap();

        let product = service
            .add_product(
                owner.id,
                AddProductInput {
                    product_name: Some("Milk".to_owned()),
                    product_price: Some(serde_json::json!(40)),
                    ..AddProductInput::default()
                },
            )
            .await
            .unwrap();
        assert!(product.is_live);
        assert_eq!(product.category, DEFAULT_CATEGORY);
        assert!(product.product_description.is_empty());

        let once = service.toggle_product(owner.id, product.id).await.unwrap();
        let twice = service.toggle_product(owner.id, product.id).await.unwrap();
        assert!(!once.is_live);
        assert_eq!(twice.is_live, product.is_live);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_blank_fields() {
        let store = MemoryStore::new();
        let creds = credentials();
        let ids = random_unique_ids();
        let service = OwnerService::new(&store, &creds, &ids);
        let (owner, _) = service.register(joe()).await.unwrap();

        let err = service
            .update_profile(
                owner.id,
                UpdateProfileInput {
                    username: Some(" ".to_owned()),
                    address: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let updated = service
            .update_profile(
                owner.id,
                UpdateProfileInput {
                    username: None,
                    address: Some("14 Main St".to_owned()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.address, "14 Main St");
        assert_eq!(updated.username, "Joe Mart");
        assert_eq!(updated.unique_id, owner.unique_id);
    }
}
