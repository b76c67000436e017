//! Customer translation

use serde_json::json;

use crate::{
    platforms::{ecommerce::models::EcommerceCustomer, erp::models::ErpCustomer},
    translation::{TranslationError, optional, required},
};

const ENTITY: &str = "ERP customer";

/// Translate an ERP customer into the e-commerce shape.
///
/// # Errors
///
/// Returns [`TranslationError::MissingField`] when the code, name or email is blank.
pub fn erp_customer_to_ecommerce(
    customer: &ErpCustomer,
    ecommerce_id: Option<&str>,
) -> Result<EcommerceCustomer, TranslationError> {
    let code = required(ENTITY, "code", &customer.code)?;
    let name = required(ENTITY, "name", &customer.name)?;
    let email = required(ENTITY, "email", customer.email.as_deref().unwrap_or_default())?;

    Ok(EcommerceCustomer {
        id: ecommerce_id.map(str::to_string),
        name: name.to_string(),
        email: email.to_string(),
        phone: optional(customer.phone.as_deref()),
        document: optional(customer.document.as_deref()),
        address: None,
        metadata: json!({
            "erp_id": customer.id,
            "erp_code": code,
        }),
    })
}
