//! E-commerce REST client

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    domain::credentials::Secret,
    platforms::{
        PlatformError,
        ecommerce::models::{
            EcommerceCustomer, EcommerceOrder, EcommercePage, EcommerceProduct, Envelope,
        },
    },
};

const PLATFORM: &str = "ecommerce";
const API_KEY_HEADER: &str = "X-API-Key";

#[automock]
#[async_trait]
pub trait EcommerceClient: Send + Sync {
    async fn get_order(&self, id: &str) -> Result<EcommerceOrder, PlatformError>;

    async fn list_products(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<EcommercePage<EcommerceProduct>, PlatformError>;

    async fn get_product(&self, id: &str) -> Result<EcommerceProduct, PlatformError>;

    /// Create or update a product; the response carries the platform-assigned id.
    async fn upsert_product(
        &self,
        product: &EcommerceProduct,
    ) -> Result<EcommerceProduct, PlatformError>;

    async fn delete_product(&self, id: &str) -> Result<(), PlatformError>;

    async fn upsert_customer(
        &self,
        customer: &EcommerceCustomer,
    ) -> Result<EcommerceCustomer, PlatformError>;
}

/// Tenant-scoped client for the e-commerce REST API.
#[derive(Debug, Clone)]
pub struct HttpEcommerceClient {
    base_url: String,
    api_key: Secret,
    http: Client,
}

impl HttpEcommerceClient {
    /// The request timeout is whatever `http` was built with.
    #[must_use]
    pub fn new(base_url: &str, api_key: Secret, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, PlatformError> {
        let response = request
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await
            .map_err(|error| PlatformError::from_reqwest(PLATFORM, error))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| PlatformError::from_reqwest(PLATFORM, error))?;

        debug!(platform = PLATFORM, %status, "platform call returned");

        decode_envelope(status, &body)
    }

    async fn send_expecting<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, PlatformError> {
        self.send(request)
            .await?
            .ok_or(PlatformError::MissingData { platform: PLATFORM })
    }
}

/// Decode a response body, treating any non-success envelope as a failure.
///
/// Returns the envelope's `data`, which may legitimately be absent for deletes.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, PlatformError> {
    let envelope = match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => envelope,
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

    if !envelope.success || !status.is_success() {
        let message = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        return Err(PlatformError::Rejected {
            platform: PLATFORM,
            message,
        });
    }

    Ok(envelope.data)
}

#[async_trait]
impl EcommerceClient for HttpEcommerceClient {
    async fn get_order(&self, id: &str) -> Result<EcommerceOrder, PlatformError> {
        self.send_expecting(self.http.get(self.url(&format!("orders/{id}"))))
            .await
    }

    async fn list_products(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<EcommercePage<EcommerceProduct>, PlatformError> {
        self.send_expecting(
            self.http
                .get(self.url("products"))
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    async fn get_product(&self, id: &str) -> Result<EcommerceProduct, PlatformError> {
        self.send_expecting(self.http.get(self.url(&format!("products/{id}"))))
            .await
    }

    async fn upsert_product(
        &self,
        product: &EcommerceProduct,
    ) -> Result<EcommerceProduct, PlatformError> {
        self.send_expecting(self.http.post(self.url("products")).json(product))
            .await
    }

    async fn delete_product(&self, id: &str) -> Result<(), PlatformError> {
        self.send::<Value>(self.http.delete(self.url(&format!("products/{id}"))))
            .await
            .map(|_data| ())
    }

    async fn upsert_customer(
        &self,
        customer: &EcommerceCustomer,
    ) -> Result<EcommerceCustomer, PlatformError> {
        self.send_expecting(self.http.post(self.url("customers")).json(customer))
            .await
    }
}
