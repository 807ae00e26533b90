//! Shop categories.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of the known shop types.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid shop type: {0}")]
pub struct ShopTypeError(pub String);

/// The fixed set of shop categories an owner can register under.
///
/// Wire names are the capitalized variant names (`"Grocery"`, `"Other"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopType {
    Grocery,
    Electronics,
    Clothing,
    Food,
    Pharmacy,
    Stationery,
    Hardware,
    Other,
}

impl ShopType {
    /// Every shop type, in display order.
    pub const ALL: [Self; 8] = [
        Self::Grocery,
        Self::Electronics,
        Self::Clothing,
        Self::Food,
        Self::Pharmacy,
        Self::Stationery,
        Self::Hardware,
        Self::Other,
    ];

    /// Wire name of the shop type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grocery => "Grocery",
            Self::Electronics => "Electronics",
            Self::Clothing => "Clothing",
            Self::Food => "Food",
            Self::Pharmacy => "Pharmacy",
            Self::Stationery => "Stationery",
            Self::Hardware => "Hardware",
            Self::Other => "Other",
        }
    }

    /// Three-letter uppercase code used in owner login IDs (`GRO`, `ELE`, ...).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Grocery => "GRO",
            Self::Electronics => "ELE",
            Self::Clothing => "CLO",
            Self::Food => "FOO",
            Self::Pharmacy => "PHA",
            Self::Stationery => "STA",
            Self::Hardware => "HAR",
            Self::Other => "OTH",
        }
    }
}

impl std::fmt::Display for ShopType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShopType {
    type Err = ShopTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ShopTypeError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_first_three_letters_uppercased() {
        for shop_type in ShopType::ALL {
            let expected: String = shop_type.as_str().chars().take(3).collect();
            assert_eq!(shop_type.code(), expected.to_uppercase());
        }
    }

    #[test]
    fn test_from_str_roundtrips_wire_names() {
        for shop_type in ShopType::ALL {
            assert_eq!(shop_type.as_str().parse::<ShopType>().unwrap(), shop_type);
        }
    }

    #[test]
    fn test_from_str_is_case_sensitive() {
        assert!("grocery".parse::<ShopType>().is_err());
        assert!("Bakery".parse::<ShopType>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_name() {
        assert_eq!(
            serde_json::to_string(&ShopType::Stationery).unwrap(),
            "\"Stationery\""
        );
    }
}
