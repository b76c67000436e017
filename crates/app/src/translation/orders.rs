//! Order translation

use std::collections::HashMap;

use jiff::{Timestamp, civil::Date, tz::TimeZone};

use crate::{
    platforms::{
        ecommerce::models::EcommerceOrder,
        erp::models::{ErpOrder, ErpOrderItem},
    },
    translation::{TranslationError, required},
};

const ENTITY: &str = "e-commerce order";

/// Mapping lookups resolved before translating an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderReferences {
    /// E-commerce product id to ERP product code, for every line that is mapped.
    pub product_codes: HashMap<String, String>,

    /// ERP customer code from the customer mapping or the configured default.
    pub customer_code: Option<String>,
}

/// Translate an e-commerce order into an ERP order.
///
/// Every line must resolve to an ERP product code; one unmapped line fails the whole
/// order.
///
/// # Errors
///
/// Returns [`TranslationError::UnmappedProduct`] for the first unmapped line,
/// [`TranslationError::UnmappedCustomer`] when no customer code was resolved, and
/// [`TranslationError::MissingField`] or [`TranslationError::InvalidField`] when the
/// order has no lines or an unreadable creation date.
pub fn ecommerce_order_to_erp(
    order: &EcommerceOrder,
    references: &OrderReferences,
) -> Result<ErpOrder, TranslationError> {
    let order_id = required(ENTITY, "id", &order.id)?;

    if order.items.is_empty() {
        return Err(TranslationError::MissingField {
            entity: ENTITY,
            field: "items",
        });
    }

    let items = order
        .items
        .iter()
        .map(|item| {
            let product_code = references.product_codes.get(&item.product_id).ok_or_else(|| {
                TranslationError::UnmappedProduct {
                    product_id: item.product_id.clone(),
                }
            })?;

            Ok(ErpOrderItem {
                product_code: product_code.clone(),
                quantity: item.quantity,
                unit_price: item.price,
            })
        })
        .collect::<Result<Vec<_>, TranslationError>>()?;

    let customer_code = references
        .customer_code
        .clone()
        .ok_or_else(|| TranslationError::UnmappedCustomer {
            customer_id: order.customer_id.clone(),
        })?;

    Ok(ErpOrder {
        number: None,
        customer_code,
        order_date: order_date(&order.created_at)?,
        items,
        total: order.total,
        status: None,
        notes: Some(format!("synced from order {order_id}")),
    })
}

/// Accepts an RFC 3339 timestamp (taken in UTC) or a bare `YYYY-MM-DD` date.
fn order_date(created_at: &str) -> Result<Date, TranslationError> {
    let value = required(ENTITY, "createdAt", created_at)?;

    if let Ok(timestamp) = value.parse::<Timestamp>() {
        return Ok(timestamp.to_zoned(TimeZone::UTC).date());
    }

    value
        .parse::<Date>()
        .map_err(|error| TranslationError::InvalidField {
            entity: ENTITY,
            field: "createdAt",
            reason: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use serde_json::Value;
    use testresult::TestResult;

    use super::*;
    use crate::platforms::ecommerce::models::EcommerceOrderItem;

    fn order() -> EcommerceOrder {
        EcommerceOrder {
            id: "O1".to_string(),
            customer_id: "C1".to_string(),
            items: vec![
                EcommerceOrderItem {
                    product_id: "P1".to_string(),
                    quantity: 2.0,
                    price: 10.0,
                },
                EcommerceOrderItem {
                    product_id: "P2".to_string(),
                    quantity: 1.0,
                    price: 5.5,
                },
            ],
            total: 25.5,
            status: "paid".to_string(),
            created_at: "2026-03-14T23:30:00Z".to_string(),
            metadata: Value::Null,
        }
    }

    fn references() -> OrderReferences {
        OrderReferences {
            product_codes: HashMap::from([
                ("P1".to_string(), "W-1".to_string()),
                ("P2".to_string(), "W-2".to_string()),
            ]),
            customer_code: Some("CUST-7".to_string()),
        }
    }

    #[test]
    fn translates_lines_customer_and_note() -> TestResult {
        let erp = ecommerce_order_to_erp(&order(), &references())?;

        assert_eq!(erp.customer_code, "CUST-7");
        assert_eq!(erp.order_date, date(2026, 3, 14));
        assert_eq!(erp.items.len(), 2);
        assert_eq!(erp.items[0].product_code, "W-1");
        assert_eq!(erp.items[1].unit_price, 5.5);
        assert_eq!(erp.notes.as_deref(), Some("synced from order O1"));
        assert_eq!(erp.number, None);

        Ok(())
    }

    #[test]
    fn one_unmapped_line_fails_the_order() {
        let mut references = references();
        references.product_codes.remove("P2");

        assert_eq!(
            ecommerce_order_to_erp(&order(), &references),
            Err(TranslationError::UnmappedProduct {
                product_id: "P2".to_string()
            })
        );
    }

    #[test]
    fn unresolved_customer_fails() {
        let references = OrderReferences {
            customer_code: None,
            ..references()
        };

        assert_eq!(
            ecommerce_order_to_erp(&order(), &references),
            Err(TranslationError::UnmappedCustomer {
                customer_id: "C1".to_string()
            })
        );
    }

    #[test]
    fn accepts_plain_dates() -> TestResult {
        let mut source = order();
        source.created_at = "2026-01-02".to_string();

        assert_eq!(
            ecommerce_order_to_erp(&source, &references())?.order_date,
            date(2026, 1, 2)
        );

        Ok(())
    }

    #[test]
    fn unreadable_date_is_invalid() {
        let mut source = order();
        source.created_at = "yesterday".to_string();

        assert!(matches!(
            ecommerce_order_to_erp(&source, &references()),
            Err(TranslationError::InvalidField {
                field: "createdAt",
                ..
            })
        ));
    }

    #[test]
    fn order_without_lines_is_rejected() {
        let mut source = order();
        source.items.clear();

        assert!(matches!(
            ecommerce_order_to_erp(&source, &references()),
            Err(TranslationError::MissingField { field: "items", .. })
        ));
    }
}
