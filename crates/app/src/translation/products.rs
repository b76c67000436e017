//! Product translation

use serde_json::json;

use crate::{
    platforms::{ecommerce::models::EcommerceProduct, erp::models::ErpProduct},
    translation::{TranslationError, optional, required},
};

const ENTITY: &str = "ERP product";

/// Translate an ERP product into the e-commerce shape.
///
/// `ecommerce_id` is the id from an existing mapping, so the upsert updates rather than
/// creates. Absent stock becomes `0`.
///
/// # Errors
///
/// Returns [`TranslationError::MissingField`] when the code or description is blank, and
/// [`TranslationError::InvalidField`] for a negative or non-finite price.
pub fn erp_product_to_ecommerce(
    product: &ErpProduct,
    ecommerce_id: Option<&str>,
) -> Result<EcommerceProduct, TranslationError> {
    let sku = required(ENTITY, "code", &product.code)?;
    let name = required(ENTITY, "description", &product.description)?;

    if !product.unit_price.is_finite() || product.unit_price < 0.0 {
        return Err(TranslationError::InvalidField {
            entity: ENTITY,
            field: "unit_price",
            reason: format!("{} is not a valid price", product.unit_price),
        });
    }

    Ok(EcommerceProduct {
        id: ecommerce_id.map(str::to_string),
        name: name.to_string(),
        sku: sku.to_string(),
        price: product.unit_price,
        description: optional(product.notes.as_deref()),
        category: optional(product.category.as_deref()),
        stock: product.stock.unwrap_or(0),
        images: Vec::new(),
        metadata: json!({
            "erp_id": product.id,
            "erp_code": sku,
            "unit": product.unit,
        }),
    })
}
