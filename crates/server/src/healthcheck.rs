//! SyncBridge Healthcheck Handler

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extensions::*;

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when every dependency is reachable, `degraded` otherwise
    pub status: String,

    /// Database reachability: `up` or `down`
    pub database: String,
}

/// Healthcheck handler
///
/// Pings the database; responds 503 when it cannot be reached.
#[endpoint(
    tags("health"),
    summary = "Health check endpoint",
    responses(
        (status_code = StatusCode::OK, description = "All dependencies reachable"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Database unreachable"),
    ),
)]
pub(crate) async fn handler(
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<HealthResponse>, StatusError> {
    let state = depot.state_or_500()?;

    let response = match state.db.ping().await {
        Ok(()) => HealthResponse {
            status: "ok".to_string(),
            database: "up".to_string(),
        },
        Err(source) => {
            warn!("database ping failed: {source}");

            res.status_code(StatusCode::SERVICE_UNAVAILABLE);

            HealthResponse {
                status: "degraded".to_string(),
                database: "down".to_string(),
            }
        }
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::{StrictMocks, state_with};

    use super::*;

    #[tokio::test]
    async fn unreachable_database_reports_degraded() -> TestResult {
        let state = state_with(StrictMocks::default())?;

        let router = Router::new()
            .hoop(inject(state))
            .push(Router::with_path("healthcheck").get(handler));

        let mut res = TestClient::get("http://example.com/healthcheck")
            .send(&Service::new(router))
            .await;

        let body: HealthResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(body.status, "degraded");
        assert_eq!(body.database, "down");

        Ok(())
    }

    #[tokio::test]
    async fn missing_state_is_an_internal_error() {
        let router = Router::new().push(Router::with_path("healthcheck").get(handler));

        let res = TestClient::get("http://example.com/healthcheck")
            .send(&Service::new(router))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
