//! Tenant-scoped client construction

use std::{sync::Arc, time::Duration};

use mockall::automock;

use crate::{
    domain::credentials::records::TenantCredentials,
    platforms::{
        PlatformError,
        ecommerce::{EcommerceClient, HttpEcommerceClient},
        erp::{ErpClient, HttpErpClient},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSettings {
    pub ecommerce_base_url: String,
    pub erp_base_url: String,
    /// Applied to every outgoing platform request.
    pub request_timeout: Duration,
}

/// Builds platform clients bound to one tenant's credentials.
#[automock]
pub trait ClientFactory: Send + Sync {
    fn ecommerce(&self, credentials: &TenantCredentials) -> Arc<dyn EcommerceClient>;

    fn erp(&self, credentials: &TenantCredentials) -> Arc<dyn ErpClient>;
}

/// Clients that share one connection pool across tenants.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    settings: PlatformSettings,
    http: reqwest::Client,
}

impl HttpClientFactory {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built (e.g. TLS backend failure).
    pub fn new(settings: PlatformSettings) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|error| PlatformError::from_reqwest("http", error))?;

        Ok(Self { settings, http })
    }
}

impl ClientFactory for HttpClientFactory {
    fn ecommerce(&self, credentials: &TenantCredentials) -> Arc<dyn EcommerceClient> {
        Arc::new(HttpEcommerceClient::new(
            &self.settings.ecommerce_base_url,
            credentials.ecommerce_api_key.clone(),
            self.http.clone(),
        ))
    }

    fn erp(&self, credentials: &TenantCredentials) -> Arc<dyn ErpClient> {
        Arc::new(HttpErpClient::new(
            &self.settings.erp_base_url,
            credentials.erp_app_key.clone(),
            credentials.erp_app_secret.clone(),
            self.http.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::domain::tenants::records::TenantUuid;

    #[test]
    fn builds_clients_for_tenant() -> TestResult {
        let factory = HttpClientFactory::new(PlatformSettings {
            ecommerce_base_url: "https://shop.example.test".to_string(),
            erp_base_url: "https://erp.example.test/api/v1/".to_string(),
            request_timeout: Duration::from_secs(5),
        })?;

        let credentials = TenantCredentials {
            tenant_uuid: TenantUuid::new(),
            ecommerce_api_key: "shop-key".into(),
            erp_app_key: "erp-key".into(),
            erp_app_secret: "erp-secret".into(),
        };

        let ecommerce = factory.ecommerce(&credentials);
        let erp = factory.erp(&credentials);

        assert_eq!(Arc::strong_count(&ecommerce), 1);
        assert_eq!(Arc::strong_count(&erp), 1);

        Ok(())
    }
}
