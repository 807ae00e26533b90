//! Human-shareable shop login IDs.
//!
//! Owners log in with a short ID such as `NEARU-GRO-7A3X2` rather than with
//! their email. The ID is derived from the shop type plus a random suffix.
//! Generation alone does not guarantee uniqueness: callers check the
//! candidate against the store and draw again on collision.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ShopType;

/// Fixed leading segment of every login ID.
pub const PREFIX: &str = "NEARU";

/// Number of random characters at the end of the ID.
pub const SUFFIX_LEN: usize = 5;

/// Alphabet for the random suffix (base-36, uppercase).
const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors that can occur when parsing a [`UniqueId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UniqueIdError {
    /// Not three dash-separated segments starting with `NEARU`.
    #[error("login ID must look like NEARU-XXX-XXXXX")]
    Malformed,
    /// The type segment is not three uppercase ASCII letters.
    #[error("login ID type code must be three uppercase letters")]
    BadTypeCode,
    /// The suffix is not five uppercase alphanumerics.
    #[error("login ID suffix must be {SUFFIX_LEN} uppercase letters or digits")]
    BadSuffix,
}

/// An owner login ID: `NEARU-<3-letter type code>-<5-char suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(String);

impl UniqueId {
    /// Draw a candidate ID for a shop of the given type.
    ///
    /// ```
    /// use nearu_core::{ShopType, UniqueId};
    ///
    /// let id = UniqueId::generate(ShopType::Grocery, &mut rand::rng());
    /// assert!(id.as_str().starts_with("NEARU-GRO-"));
    /// ```
    pub fn generate<R: Rng + ?Sized>(shop_type: ShopType, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
                char::from(SUFFIX_ALPHABET.get(idx).copied().unwrap_or(b'0'))
            })
            .collect();
        Self(format!("{PREFIX}-{}-{suffix}", shop_type.code()))
    }

    /// Parse a login ID typed by a user.
    ///
    /// Surrounding whitespace is ignored; letter case is not normalized, since
    /// issued IDs are always uppercase.
    ///
    /// # Errors
    ///
    /// Returns `UniqueIdError` if the input does not match the issued format.
    pub fn parse(s: &str) -> Result<Self, UniqueIdError> {
        let s = s.trim();
        let mut parts = s.split('-');
        let (Some(prefix), Some(code), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(UniqueIdError::Malformed);
        };

        if prefix != PREFIX {
            return Err(UniqueIdError::Malformed);
        }
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(UniqueIdError::BadTypeCode);
        }
        if suffix.len() != SUFFIX_LEN || !suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b)) {
            return Err(UniqueIdError::BadSuffix);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UniqueId {
    type Err = UniqueIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for UniqueId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for UniqueId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_generated_ids_parse_back() {
        let mut rng = StdRng::seed_from_u64(7);
        for shop_type in ShopType::ALL {
            let id = UniqueId::generate(shop_type, &mut rng);
            assert_eq!(UniqueId::parse(id.as_str()).unwrap(), id);
            assert!(id.as_str().starts_with(&format!("NEARU-{}-", shop_type.code())));
        }
    }

    #[test]
    fn test_generated_suffix_is_uppercase_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let id = UniqueId::generate(ShopType::Pharmacy, &mut rng);
            let suffix = id.as_str().rsplit('-').next().unwrap();
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(
                suffix
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
            );
        }
    }

    #[test]
    fn test_generation_spreads_over_suffix_space() {
        let mut rng = StdRng::seed_from_u64(1);
        let ids: HashSet<_> = (0..500)
            .map(|_| UniqueId::generate(ShopType::Food, &mut rng))
            .collect();
        // 36^5 candidates; 500 draws should practically never collide
        assert!(ids.len() > 495);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            UniqueId::parse(" NEARU-GRO-7A3X2 ").unwrap().as_str(),
            "NEARU-GRO-7A3X2"
        );
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert_eq!(UniqueId::parse("NEARU-GRO"), Err(UniqueIdError::Malformed));
        assert_eq!(
            UniqueId::parse("NEARU-GRO-7A3X2-X"),
            Err(UniqueIdError::Malformed)
        );
        assert_eq!(UniqueId::parse("SHOP-GRO-7A3X2"), Err(UniqueIdError::Malformed));
        assert_eq!(UniqueId::parse("NEARU-gro-7A3X2"), Err(UniqueIdError::BadTypeCode));
        assert_eq!(UniqueId::parse("NEARU-GR-7A3X2"), Err(UniqueIdError::BadTypeCode));
        assert_eq!(UniqueId::parse("NEARU-GRO-7a3x2"), Err(UniqueIdError::BadSuffix));
        assert_eq!(UniqueId::parse("NEARU-GRO-7A3X"), Err(UniqueIdError::BadSuffix));
    }
}
