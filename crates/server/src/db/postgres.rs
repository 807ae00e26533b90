//! `PostgreSQL` implementation of [`MarketStore`].
//!
//! Owners and products live in separate tables; an owner is always loaded
//! together with its products (ordered by insertion `position`). Every
//! mutation runs in a transaction that also touches the owner's
//! `updated_at`, and flag toggles use `SET flag = NOT flag` so concurrent
//! toggles never lose an update.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use nearu_core::{AccountId, Email, OwnerId, Price, ProductId, ShopType, UniqueId, UserId};

use super::{MarketStore, RepositoryError};
use crate::models::{
    NewOwner, NewProduct, NewUser, OwnerProfileUpdate, Principal, Product, ShopOwner, User,
};

const OWNER_EMAIL_KEY: &str = "shop_owner_email_key";
const OWNER_UNIQUE_ID_KEY: &str = "shop_owner_unique_id_key";

const OWNER_COLUMNS: &str = "id, username, email, password_hash, address, shop_type, unique_id, \
                             is_shop_open, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, owner_id, product_name, product_price, product_description, \
                               product_image, category, is_live, created_at, updated_at";

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OwnerRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    address: String,
    shop_type: String,
    unique_id: String,
    is_shop_open: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OwnerRow {
    fn into_owner(self, products: Vec<Product>) -> Result<ShopOwner, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let shop_type: ShopType = self.shop_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop type in database: {e}"))
        })?;
        let unique_id = UniqueId::parse(&self.unique_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid login ID in database: {e}"))
        })?;

        Ok(ShopOwner {
            id: OwnerId::from_uuid(self.id),
            username: self.username,
            email,
            password_hash: self.password_hash,
            address: self.address,
            shop_type,
            unique_id,
            is_shop_open: self.is_shop_open,
            products,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    owner_id: Uuid,
    product_name: String,
    product_price: Decimal,
    product_description: String,
    product_image: String,
    category: String,
    is_live: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let product_price = Price::new(row.product_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::from_uuid(row.id),
            product_name: row.product_name,
            product_price,
            product_description: row.product_description,
            product_image: row.product_image,
            category: row.category,
            is_live: row.is_live,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Map a unique violation on an owner insert to the key it hit.
fn owner_insert_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return match db_err.constraint() {
            Some(OWNER_UNIQUE_ID_KEY) => RepositoryError::DuplicateUniqueId,
            Some(OWNER_EMAIL_KEY) | None => RepositoryError::DuplicateEmail,
            Some(other) => {
                RepositoryError::DataCorruption(format!("unexpected unique constraint {other}"))
            }
        };
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Store
// =============================================================================

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool. Migrations must already have been applied.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach products to a batch of owner rows, preserving row order.
    async fn hydrate(&self, rows: Vec<OwnerRow>) -> Result<Vec<ShopOwner>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let product_rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM nearu.shop_product \
             WHERE owner_id = ANY($1) ORDER BY position"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_owner: HashMap<Uuid, Vec<Product>> = HashMap::new();
        for row in product_rows {
            let owner_id = row.owner_id;
            by_owner.entry(owner_id).or_default().push(row.try_into()?);
        }

        rows.into_iter()
            .map(|row| {
                let products = by_owner.remove(&row.id).unwrap_or_default();
                row.into_owner(products)
            })
            .collect()
    }

    async fn fetch_owner_where(
        &self,
        clause: &str,
        bind: impl for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send,
    ) -> Result<Option<ShopOwner>, RepositoryError> {
        let row = sqlx::query_as::<_, OwnerRow>(&format!(
            "SELECT {OWNER_COLUMNS} FROM nearu.shop_owner WHERE {clause}"
        ))
        .bind(bind)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn fetch_user_where(
        &self,
        clause: &str,
        bind: impl for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM nearu.app_user WHERE {clause}"
        ))
        .bind(bind)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

/// Bump the owner's `updated_at`, locking the row for the rest of the transaction.
async fn touch_owner(
    tx: &mut Transaction<'_, Postgres>,
    owner: OwnerId,
) -> Result<(), RepositoryError> {
    let touched: Option<(Uuid,)> = sqlx::query_as(
        "UPDATE nearu.shop_owner SET updated_at = now() WHERE id = $1 RETURNING id",
    )
    .bind(owner)
    .fetch_optional(&mut **tx)
    .await?;

    touched.map(|_| ()).ok_or(RepositoryError::NotFound("Owner"))
}

#[async_trait]
impl MarketStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create_owner(&self, owner: NewOwner) -> Result<ShopOwner, RepositoryError> {
        let row = sqlx::query_as::<_, OwnerRow>(&format!(
            "INSERT INTO nearu.shop_owner \
                 (id, username, email, password_hash, address, shop_type, unique_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {OWNER_COLUMNS}"
        ))
        .bind(OwnerId::generate())
        .bind(&owner.username)
        .bind(&owner.email)
        .bind(&owner.password_hash)
        .bind(&owner.address)
        .bind(owner.shop_type.as_str())
        .bind(owner.unique_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(owner_insert_error)?;

        row.into_owner(Vec::new())
    }

    async fn find_owner_by_id(&self, id: OwnerId) -> Result<Option<ShopOwner>, RepositoryError> {
        self.fetch_owner_where("id = $1", id).await
    }

    async fn find_owner_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<ShopOwner>, RepositoryError> {
        self.fetch_owner_where("email = $1", email.as_str().to_owned())
            .await
    }

    async fn find_owner_by_unique_id(
        &self,
        unique_id: &UniqueId,
    ) -> Result<Option<ShopOwner>, RepositoryError> {
        self.fetch_owner_where("unique_id = $1", unique_id.as_str().to_owned())
            .await
    }

    async fn unique_id_exists(&self, unique_id: &UniqueId) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM nearu.shop_owner WHERE unique_id = $1)",
        )
        .bind(unique_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn update_owner_profile(
        &self,
        id: OwnerId,
        update: OwnerProfileUpdate,
    ) -> Result<ShopOwner, RepositoryError> {
        let updated: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE nearu.shop_owner \
             SET username = COALESCE($2, username), \
                 address = COALESCE($3, address), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING id",
        )
        .bind(id)
        .bind(update.username)
        .bind(update.address)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_none() {
            return Err(RepositoryError::NotFound("Owner"));
        }
        self.find_owner_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound("Owner"))
    }

    async fn push_product(
        &self,
        owner: OwnerId,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        touch_owner(&mut tx, owner).await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO nearu.shop_product \
                 (id, owner_id, product_name, product_price, product_description, \
                  product_image, category) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(ProductId::generate())
        .bind(owner)
        .bind(&product.product_name)
        .bind(product.product_price.amount())
        .bind(&product.product_description)
        .bind(&product.product_image)
        .bind(&product.category)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn toggle_product(
        &self,
        owner: OwnerId,
        product: ProductId,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        touch_owner(&mut tx, owner).await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE nearu.shop_product \
             SET is_live = NOT is_live, updated_at = now() \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("Product"))?;

        tx.commit().await?;
        row.try_into()
    }

    async fn remove_product(
        &self,
        owner: OwnerId,
        product: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        touch_owner(&mut tx, owner).await?;

        let result = sqlx::query("DELETE FROM nearu.shop_product WHERE id = $1 AND owner_id = $2")
            .bind(product)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Product"));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn toggle_shop(&self, owner: OwnerId) -> Result<bool, RepositoryError> {
        let open: Option<(bool,)> = sqlx::query_as(
            "UPDATE nearu.shop_owner \
             SET is_shop_open = NOT is_shop_open, updated_at = now() \
             WHERE id = $1 \
             RETURNING is_shop_open",
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        open.map(|(open,)| open)
            .ok_or(RepositoryError::NotFound("Owner"))
    }

    async fn list_open_owners(&self) -> Result<Vec<ShopOwner>, RepositoryError> {
        let rows = sqlx::query_as::<_, OwnerRow>(&format!(
            "SELECT {OWNER_COLUMNS} FROM nearu.shop_owner WHERE is_shop_open ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO nearu.app_user (id, username, email, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(UserId::generate())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::DuplicateEmail;
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.fetch_user_where("id = $1", id).await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.fetch_user_where("email = $1", email.as_str().to_owned())
            .await
    }

    async fn find_principal(&self, id: AccountId) -> Result<Option<Principal>, RepositoryError> {
        let kind: Option<(String,)> =
            sqlx::query_as("SELECT kind FROM nearu.account_identity WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match kind.as_ref().map(|(k,)| k.as_str()) {
            Some("owner") => Ok(self
                .find_owner_by_id(OwnerId::from_uuid(id.as_uuid()))
                .await?
                .map(Principal::Owner)),
            Some("user") => Ok(self
                .find_user_by_id(UserId::from_uuid(id.as_uuid()))
                .await?
                .map(Principal::User)),
            Some(other) => Err(RepositoryError::DataCorruption(format!(
                "unknown account kind {other}"
            ))),
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
