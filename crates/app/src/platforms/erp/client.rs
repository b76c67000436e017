//! ERP RPC client

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    domain::credentials::Secret,
    platforms::{
        PlatformError,
        erp::models::{
            CodeParam, ErpCustomer, ErpOrder, ErpPage, ErpProduct, NumberParam, PageParam,
            RpcRequest, RpcResponse,
        },
    },
};

const PLATFORM: &str = "erp";

const PRODUCTS: &str = "products";
const ORDERS: &str = "orders";
const CUSTOMERS: &str = "customers";

#[automock]
#[async_trait]
pub trait ErpClient: Send + Sync {
    async fn get_product(&self, code: &str) -> Result<ErpProduct, PlatformError>;

    async fn list_products(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ErpPage<ErpProduct>, PlatformError>;

    /// Create an order; the returned order carries the ERP-assigned number.
    async fn create_order(&self, order: &ErpOrder) -> Result<ErpOrder, PlatformError>;

    async fn get_order(&self, number: &str) -> Result<ErpOrder, PlatformError>;

    async fn upsert_customer(&self, customer: &ErpCustomer) -> Result<ErpCustomer, PlatformError>;

    async fn list_customers(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ErpPage<ErpCustomer>, PlatformError>;
}

/// Tenant-scoped client for the ERP RPC API.
#[derive(Debug, Clone)]
pub struct HttpErpClient {
    base_url: String,
    app_key: Secret,
    app_secret: Secret,
    http: Client,
}

impl HttpErpClient {
    #[must_use]
    pub fn new(base_url: &str, app_key: Secret, app_secret: Secret, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_key,
            app_secret,
            http,
        }
    }

    /// Issue one RPC: `POST {base}/{service}` with the operation name in `call`.
    async fn call<P, T>(&self, service: &str, operation: &str, param: &P) -> Result<T, PlatformError>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = RpcRequest {
            call: operation,
            app_key: self.app_key.expose(),
            app_secret: self.app_secret.expose(),
            param: [param],
        };

        let response = self
            .http
            .post(format!("{}/{service}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|error| PlatformError::from_reqwest(PLATFORM, error))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| PlatformError::from_reqwest(PLATFORM, error))?;

        debug!(platform = PLATFORM, service, operation, %status, "platform call returned");

        decode_rpc(status, &text)
    }
}

/// Decode an RPC response body. Faults are failures whatever the HTTP status.
pub(crate) fn decode_rpc<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, PlatformError> {
    let response = match serde_json::from_str::<RpcResponse<T>>(body) {
        Ok(response) => response,
        Err(_) if !status.is_success() => {
            return Err(PlatformError::Status {
                platform: PLATFORM,
                status: status.as_u16(),
            });
        }
        Err(source) => {
            return Err(PlatformError::Decode {
                platform: PLATFORM,
                source,
            });
        }
    };

    if let Some(code) = response.faultcode {
        return Err(PlatformError::Fault {
            platform: PLATFORM,
            code,
            message: response.faultstring.unwrap_or_default(),
        });
    }

    if !status.is_success() {
        return Err(PlatformError::Status {
            platform: PLATFORM,
            status: status.as_u16(),
        });
    }

    response
        .data
        .ok_or(PlatformError::MissingData { platform: PLATFORM })
}

#[async_trait]
impl ErpClient for HttpErpClient {
    async fn get_product(&self, code: &str) -> Result<ErpProduct, PlatformError> {
        self.call(PRODUCTS, "GetProduct", &CodeParam { code }).await
    }

    async fn list_products(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ErpPage<ErpProduct>, PlatformError> {
        let param = PageParam {
            page,
            per_page: limit,
        };

        self.call(PRODUCTS, "ListProducts", &param).await
    }

    async fn create_order(&self, order: &ErpOrder) -> Result<ErpOrder, PlatformError> {
        self.call(ORDERS, "CreateOrder", order).await
    }

    async fn get_order(&self, number: &str) -> Result<ErpOrder, PlatformError> {
        self.call(ORDERS, "GetOrder", &NumberParam { number }).await
    }

    async fn upsert_customer(&self, customer: &ErpCustomer) -> Result<ErpCustomer, PlatformError> {
        self.call(CUSTOMERS, "UpsertCustomer", customer).await
    }

    async fn list_customers(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<ErpPage<ErpCustomer>, PlatformError> {
        let param = PageParam {
            page,
            per_page: limit,
        };

        self.call(CUSTOMERS, "ListCustomers", &param).await
    }
}
