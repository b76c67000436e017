//! Synchronised entity kinds.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{Row, postgres::PgRow};
use thiserror::Error;

/// Kind of business entity shared between the two platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Product,
    Order,
    Customer,
    Invoice,
    Payment,
}

impl EntityType {
    /// Every entity type, in provisioning order.
    pub const ALL: [Self; 5] = [
        Self::Product,
        Self::Order,
        Self::Customer,
        Self::Invoice,
        Self::Payment,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "PRODUCT",
            Self::Order => "ORDER",
            Self::Customer => "CUSTOMER",
            Self::Invoice => "INVOICE",
            Self::Payment => "PAYMENT",
        }
    }

    /// Read an entity type stored as text in `column`.
    pub(crate) fn decode(row: &PgRow, column: &str) -> sqlx::Result<Self> {
        let value: String = row.try_get(column)?;

        value.parse().map_err(|error| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(error),
        })
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown entity type `{0}`")]
pub struct UnknownEntityType(pub String);

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "PRODUCT" => Ok(Self::Product),
            "ORDER" => Ok(Self::Order),
            "CUSTOMER" => Ok(Self::Customer),
            "INVOICE" => Ok(Self::Invoice),
            "PAYMENT" => Ok(Self::Payment),
            _ => Err(UnknownEntityType(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("product".parse::<EntityType>(), Ok(EntityType::Product));
        assert_eq!("ORDER".parse::<EntityType>(), Ok(EntityType::Order));
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("widget".parse::<EntityType>().is_err());
    }

    #[test]
    fn serializes_as_screaming_case() {
        let encoded = serde_json::to_string(&EntityType::Customer).ok();

        assert_eq!(encoded.as_deref(), Some("\"CUSTOMER\""));
    }
}
