//! Translation errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("{entity} is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} field `{field}` is invalid: {reason}")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },

    /// An order line references a product with no mapping yet.
    #[error("product `{product_id}` is not mapped")]
    UnmappedProduct { product_id: String },

    /// The customer has no mapping and no default customer is configured.
    #[error("customer `{customer_id}` is not mapped")]
    UnmappedCustomer { customer_id: String },
}
