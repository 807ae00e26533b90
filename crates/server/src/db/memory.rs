//! In-memory implementation of [`MarketStore`].
//!
//! All state lives behind a single `tokio::sync::RwLock`, so every mutation
//! is serialized and reads see a consistent snapshot. Nothing is durable:
//! state is lost on restart. Used by the test suites and by
//! `NEARU_STORE=memory` for local demos without `PostgreSQL`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use nearu_core::{AccountId, Email, OwnerId, ProductId, UniqueId, UserId};

use super::{MarketStore, RepositoryError};
use crate::models::{
    NewOwner, NewProduct, NewUser, OwnerProfileUpdate, Principal, Product, ShopOwner, User,
};

#[derive(Debug, Default)]
struct Inner {
    /// Owners in registration order. Owners are never removed, so indices are stable.
    owners: Vec<ShopOwner>,
    owner_index: HashMap<OwnerId, usize>,
    users: Vec<User>,
    user_index: HashMap<UserId, usize>,
}

impl Inner {
    fn owner_mut(&mut self, id: OwnerId) -> Result<&mut ShopOwner, RepositoryError> {
        let idx = *self
            .owner_index
            .get(&id)
            .ok_or(RepositoryError::NotFound("Owner"))?;
        self.owners
            .get_mut(idx)
            .ok_or_else(|| RepositoryError::DataCorruption(format!("dangling owner index {idx}")))
    }

    fn owner(&self, id: OwnerId) -> Option<&ShopOwner> {
        self.owner_index
            .get(&id)
            .and_then(|&idx| self.owners.get(idx))
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.user_index.get(&id).and_then(|&idx| self.users.get(idx))
    }
}

/// Volatile store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<ShopOwner, RepositoryError> {
        let mut inner = self.inner.write().await;

        if inner.owners.iter().any(|o| o.email == owner.email) {
            return Err(RepositoryError::DuplicateEmail);
        }
        if inner.owners.iter().any(|o| o.unique_id == owner.unique_id) {
            return Err(RepositoryError::DuplicateUniqueId);
        }

        let now = Utc::now();
        let created = ShopOwner {
            id: OwnerId::generate(),
            username: owner.username,
            email: owner.email,
            password_hash: owner.password_hash,
            address: owner.address,
            shop_type: owner.shop_type,
            unique_id: owner.unique_id,
            is_shop_open: true,
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let idx = inner.owners.len();
        inner.owner_index.insert(created.id, idx);
        inner.owners.push(created.clone());
        Ok(created)
    }

    async fn find_owner_by_id(&self, id: OwnerId) -> Result<Option<ShopOwner>, RepositoryError> {
        Ok(self.inner.read().await.owner(id).cloned())
    }

    async fn find_owner_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<ShopOwner>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.owners.iter().find(|o| &o.email == email).cloned())
    }

    async fn find_owner_by_unique_id(
        &self,
        unique_id: &UniqueId,
    ) -> Result<Option<ShopOwner>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .owners
            .iter()
            .find(|o| &o.unique_id == unique_id)
            .cloned())
    }

    async fn unique_id_exists(&self, unique_id: &UniqueId) -> Result<bool, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.owners.iter().any(|o| &o.unique_id == unique_id))
    }

    async fn update_owner_profile(
        &self,
        id: OwnerId,
        update: OwnerProfileUpdate,
    ) -> Result<ShopOwner, RepositoryError> {
        let mut inner = self.inner.write().await;
        let owner = inner.owner_mut(id)?;
        if let Some(username) = update.username {
            owner.username = username;
        }
        if let Some(address) = update.address {
            owner.address = address;
        }
        owner.updated_at = Utc::now();
        Ok(owner.clone())
    }

    async fn push_product(
        &self,
        owner: OwnerId,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut inner = self.inner.write().await;
        let owner = inner.owner_mut(owner)?;

        let now = Utc::now();
        let created = Product {
            id: ProductId::generate(),
            product_name: product.product_name,
            product_price: product.product_price,
            product_description: product.product_description,
            product_image: product.product_image,
            category: product.category,
            is_live: true,
            created_at: now,
            updated_at: now,
        };
        owner.products.push(created.clone());
        owner.updated_at = now;
        Ok(created)
    }

    async fn toggle_product(
        &self,
        owner: OwnerId,
        product: ProductId,
    ) -> Result<Product, RepositoryError> {
        let mut inner = self.inner.write().await;
        let owner = inner.owner_mut(owner)?;

        let now = Utc::now();
        let product = owner
            .products
            .iter_mut()
            .find(|p| p.id == product)
            .ok_or(RepositoryError::NotFound("Product"))?;
        product.is_live = !product.is_live;
        product.updated_at = now;
        let toggled = product.clone();
        owner.updated_at = now;
        Ok(toggled)
    }

    async fn remove_product(
        &self,
        owner: OwnerId,
        product: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let owner = inner.owner_mut(owner)?;

        let before = owner.products.len();
        owner.products.retain(|p| p.id != product);
        if owner.products.len() == before {
            return Err(RepositoryError::NotFound("Product"));
        }
        owner.updated_at = Utc::now();
        Ok(())
    }

    async fn toggle_shop(&self, owner: OwnerId) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let owner = inner.owner_mut(owner)?;
        owner.is_shop_open = !owner.is_shop_open;
        owner.updated_at = Utc::now();
        Ok(owner.is_shop_open)
    }

    async fn list_open_owners(&self) -> Result<Vec<ShopOwner>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .owners
            .iter()
            .filter(|o| o.is_shop_open)
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::DuplicateEmail);
        }

        let now = Utc::now();
        let created = User {
            id: UserId::generate(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };

        let idx = inner.users.len();
        inner.user_index.insert(created.id, idx);
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.inner.read().await.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn find_principal(&self, id: AccountId) -> Result<Option<Principal>, RepositoryError> {
        let inner = self.inner.read().await;
        if let Some(owner) = inner.owner(OwnerId::from_uuid(id.as_uuid())) {
            return Ok(Some(Principal::Owner(owner.clone())));
        }
        Ok(inner
            .user(UserId::from_uuid(id.as_uuid()))
            .cloned()
            .map(Principal::User))
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
