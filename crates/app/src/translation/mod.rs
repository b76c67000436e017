//! Translation
//!
//! Pure conversions between the two platforms' entity shapes. Nothing here performs
//! I/O: callers resolve mappings first and pass the results in, and any missing
//! required field or reference is an error rather than a partial entity.

mod customers;
mod errors;
mod orders;
mod products;

use serde::Serialize;
use serde_json::{Value, json};

pub use customers::erp_customer_to_ecommerce;
pub use errors::TranslationError;
pub use orders::{OrderReferences, ecommerce_order_to_erp};
pub use products::erp_product_to_ecommerce;

/// Mapping metadata holding both sides as they were at the last sync.
pub fn snapshot(ecommerce: &impl Serialize, erp: &impl Serialize) -> Value {
    json!({
        "ecommerce": ecommerce,
        "erp": erp,
    })
}

fn required<'a>(
    entity: &'static str,
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, TranslationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(TranslationError::MissingField { entity, field });
    }

    Ok(trimmed)
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
