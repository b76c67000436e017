//! Scripted platform clients.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    domain::credentials::records::TenantCredentials,
    platforms::{
        ClientFactory, PlatformError,
        ecommerce::{
            EcommerceClient,
            models::{
                EcommerceCustomer, EcommerceOrder, EcommerceOrderItem, EcommercePage,
                EcommerceProduct, Pagination,
            },
        },
        erp::{
            ErpClient,
            models::{ErpCustomer, ErpOrder, ErpPage, ErpProduct},
        },
    },
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn paged<T: Clone>(records: &[T], page: u32, limit: u32) -> (Vec<T>, u32) {
    let limit = limit.max(1) as usize;
    let total_pages = u32::try_from(records.len().div_ceil(limit)).unwrap_or(u32::MAX);
    let start = (page.saturating_sub(1) as usize).saturating_mul(limit);

    let slice = records.iter().skip(start).take(limit).cloned().collect();

    (slice, total_pages)
}

pub(crate) fn erp_product(id: &str, code: &str) -> ErpProduct {
    ErpProduct {
        id: id.to_string(),
        code: code.to_string(),
        description: format!("Product {code}"),
        unit_price: 10.0,
        unit: Some("UN".to_string()),
        category: None,
        stock: Some(5),
        notes: None,
        extra: json!({}),
    }
}

pub(crate) fn ecommerce_order(id: &str, customer: &str, products: &[&str]) -> EcommerceOrder {
    EcommerceOrder {
        id: id.to_string(),
        customer_id: customer.to_string(),
        items: products
            .iter()
            .map(|product| EcommerceOrderItem {
                product_id: (*product).to_string(),
                quantity: 1.0,
                price: 10.0,
            })
            .collect(),
        total: 10.0 * products.len() as f64,
        status: "paid".to_string(),
        created_at: "2026-03-04T10:00:00Z".to_string(),
        metadata: json!({}),
    }
}

/// E-commerce platform holding orders and products in memory.
#[derive(Debug, Default)]
pub(crate) struct FakeEcommerce {
    orders: Mutex<HashMap<String, EcommerceOrder>>,
    products: Mutex<Vec<EcommerceProduct>>,
    customers: Mutex<Vec<EcommerceCustomer>>,
    deleted: Mutex<Vec<String>>,
    /// SKUs whose upsert fails with a server error.
    failing_skus: Mutex<HashSet<String>>,
}

impl FakeEcommerce {
    pub(crate) fn add_order(&self, order: EcommerceOrder) {
        lock(&self.orders).insert(order.id.clone(), order);
    }

    pub(crate) fn fail_sku(&self, sku: &str) {
        lock(&self.failing_skus).insert(sku.to_string());
    }

    pub(crate) fn heal(&self) {
        lock(&self.failing_skus).clear();
    }

    pub(crate) fn products(&self) -> Vec<EcommerceProduct> {
        lock(&self.products).clone()
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }
}

#[async_trait]
impl EcommerceClient for FakeEcommerce {
    async fn get_order(&self, id: &str) -> Result<EcommerceOrder, PlatformError> {
        lock(&self.orders)
            .get(id)
            .cloned()
            .ok_or(PlatformError::Status {
                platform: "ecommerce",
                status: 404,
            })
    }

    async fn list_products(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<EcommercePage<EcommerceProduct>, PlatformError> {
        let products = lock(&self.products);
        let (data, total_pages) = paged(&products, page, limit);

        Ok(EcommercePage {
            data,
            pagination: Pagination {
                page,
                limit,
                total: products.len() as u64,
                total_pages,
            },
        })
    }

    async fn get_product(&self, id: &str) -> Result<EcommerceProduct, PlatformError> {
        lock(&self.products)
            .iter()
            .find(|product| product.id.as_deref() == Some(id))
            .cloned()
            .ok_or(PlatformError::Status {
                platform: "ecommerce",
                status: 404,
            })
    }

    async fn upsert_product(
        &self,
        product: &EcommerceProduct,
    ) -> Result<EcommerceProduct, PlatformError> {
        if lock(&self.failing_skus).contains(&product.sku) {
            return Err(PlatformError::Status {
                platform: "ecommerce",
                status: 503,
            });
        }

        let mut products = lock(&self.products);

        if let Some(id) = &product.id
            && let Some(existing) = products
                .iter_mut()
                .find(|stored| stored.id.as_ref() == Some(id))
        {
            *existing = product.clone();
            return Ok(existing.clone());
        }

        let mut created = product.clone();
        created.id = Some(format!("E-{}", products.len() + 1));
        products.push(created.clone());

        Ok(created)
    }

    async fn delete_product(&self, id: &str) -> Result<(), PlatformError> {
        lock(&self.products).retain(|product| product.id.as_deref() != Some(id));
        lock(&self.deleted).push(id.to_string());

        Ok(())
    }

    async fn upsert_customer(
        &self,
        customer: &EcommerceCustomer,
    ) -> Result<EcommerceCustomer, PlatformError> {
        let mut customers = lock(&self.customers);

        let mut created = customer.clone();
        created.id = Some(format!("C-{}", customers.len() + 1));
        customers.push(created.clone());

        Ok(created)
    }
}

/// ERP holding products and customers in memory and numbering created orders.
#[derive(Debug, Default)]
pub(crate) struct FakeErp {
    products: Mutex<Vec<ErpProduct>>,
    customers: Mutex<Vec<ErpCustomer>>,
    orders: Mutex<Vec<ErpOrder>>,
    /// Accept orders without assigning a number.
    unnumbered: Mutex<bool>,
}

impl FakeErp {
    pub(crate) fn stop_numbering(&self) {
        *lock(&self.unnumbered) = true;
    }

    pub(crate) fn add_product(&self, product: ErpProduct) {
        lock(&self.products).push(product);
    }

    pub(crate) fn orders(&self) -> Vec<ErpOrder> {
        lock(&self.orders).clone()
    }
}

#[async_trait]
impl ErpClient for FakeErp {
    async fn get_product(&self, code: &str) -> Result<ErpProduct, PlatformError> {
        lock(&self.products)
            .iter()
            .find(|product| product.code == code)
            .cloned()
            .ok_or(PlatformError::Fault {
                platform: "erp",
                code: "SOAP-ENV:Client-5113".to_string(),
                message: format!("product {code} not found"),
            })
    }

    async fn list_products(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ErpPage<ErpProduct>, PlatformError> {
        let (records, total_pages) = paged(&lock(&self.products), page, limit);

        Ok(ErpPage {
            page,
            total_pages,
            records,
        })
    }

    async fn create_order(&self, order: &ErpOrder) -> Result<ErpOrder, PlatformError> {
        let mut orders = lock(&self.orders);

        let mut created = order.clone();
        created.number = Some(format!("{}", 1000 + orders.len() + 1));
        orders.push(created.clone());

        if *lock(&self.unnumbered) {
            created.number = None;
        }

        Ok(created)
    }

    async fn get_order(&self, number: &str) -> Result<ErpOrder, PlatformError> {
        lock(&self.orders)
            .iter()
            .find(|order| order.number.as_deref() == Some(number))
            .cloned()
            .ok_or(PlatformError::MissingData { platform: "erp" })
    }

    async fn upsert_customer(&self, customer: &ErpCustomer) -> Result<ErpCustomer, PlatformError> {
        lock(&self.customers).push(customer.clone());

        Ok(customer.clone())
    }

    async fn list_customers(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ErpPage<ErpCustomer>, PlatformError> {
        let (records, total_pages) = paged(&lock(&self.customers), page, limit);

        Ok(ErpPage {
            page,
            total_pages,
            records,
        })
    }
}

/// Hands the same pair of fakes to every tenant.
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeClientFactory {
    pub ecommerce: Arc<FakeEcommerce>,
    pub erp: Arc<FakeErp>,
}

impl ClientFactory for FakeClientFactory {
    fn ecommerce(&self, _credentials: &TenantCredentials) -> Arc<dyn EcommerceClient> {
        self.ecommerce.clone()
    }

    fn erp(&self, _credentials: &TenantCredentials) -> Arc<dyn ErpClient> {
        self.erp.clone()
    }
}
