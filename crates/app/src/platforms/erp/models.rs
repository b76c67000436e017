//! ERP wire models

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of every ERP RPC request.
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a, P> {
    pub call: &'a str,
    pub app_key: &'a str,
    pub app_secret: &'a str,
    pub param: [&'a P; 1],
}

/// Body of every ERP RPC response. A present `faultcode` wins over `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub faultcode: Option<String>,
    pub faultstring: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpProduct {
    /// Native identifier; the cursor-sync watermark for products.
    pub id: String,
    pub code: String,
    pub description: String,
    pub unit_price: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub extra: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpOrderItem {
    pub product_code: String,
    pub quantity: f64,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpOrder {
    /// Assigned by the ERP on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub customer_code: String,
    pub order_date: Date,
    pub items: Vec<ErpOrderItem>,
    pub total: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpCustomer {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpPage<T> {
    pub page: u32,
    pub total_pages: u32,
    pub records: Vec<T>,
}

/// Paging parameters shared by the list operations.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct PageParam {
    pub page: u32,
    pub per_page: u32,
}

/// Lookup by a single key, e.g. `{"code": "..."}`.
#[derive(Debug, Serialize)]
pub(crate) struct CodeParam<'a> {
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct NumberParam<'a> {
    pub number: &'a str,
}
