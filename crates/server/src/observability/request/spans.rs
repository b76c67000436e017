//! Span naming and attributes for inbound requests.

use std::str::FromStr as _;

use syncbridge_app::domain::webhooks::records::WebhookSource;
use uuid::Uuid;

/// Route label plus the sync attributes a request carries in its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RequestRoute {
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
    pub(super) tenant: Option<Uuid>,
    pub(super) webhook_source: Option<WebhookSource>,
}

pub(super) fn request_route(method: &str, path: &str) -> RequestRoute {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    let (tenant, webhook_source) = match segments.as_slice() {
        ["tenants", tenant, "webhooks", source] => (
            Uuid::parse_str(tenant).ok(),
            WebhookSource::from_str(source).ok(),
        ),
        _ => (None, None),
    };

    let otel_path = if segments.is_empty() {
        "/".to_owned()
    } else {
        let labels: Vec<&str> = segments
            .iter()
            .enumerate()
            .map(|(index, segment)| route_label(&segments, index, segment))
            .collect();

        format!("/{}", labels.join("/"))
    };

    RequestRoute {
        otel_span_name: format!("{method} {otel_path}"),
        otel_path,
        tenant,
        webhook_source,
    }
}

/// Uuids collapse to `{uuid}`; a webhook source outside the known set collapses to
/// `{source}` so arbitrary paths cannot grow the label set.
fn route_label<'a>(segments: &[&str], index: usize, segment: &'a str) -> &'a str {
    if Uuid::parse_str(segment).is_ok() {
        return "{uuid}";
    }

    let is_source_segment = index == 3
        && segments.len() == 4
        && segments.first() == Some(&"tenants")
        && segments.get(2) == Some(&"webhooks");

    if is_source_segment && WebhookSource::from_str(segment).is_err() {
        "{source}"
    } else {
        segment
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const TENANT: &str = "01890a5d-ac96-774b-bcce-b302099a8057";

    #[test]
    fn webhook_route_exposes_tenant_and_source() -> TestResult {
        let route = request_route("POST", &format!("/tenants/{TENANT}/webhooks/erp"));

        assert_eq!(route.otel_path, "/tenants/{uuid}/webhooks/erp");
        assert_eq!(route.otel_span_name, "POST /tenants/{uuid}/webhooks/erp");
        assert_eq!(route.tenant, Some(Uuid::parse_str(TENANT)?));
        assert_eq!(route.webhook_source, Some(WebhookSource::Erp));

        Ok(())
    }

    #[test]
    fn unknown_source_is_collapsed() {
        let route = request_route("POST", &format!("/tenants/{TENANT}/webhooks/crm"));

        assert_eq!(route.otel_path, "/tenants/{uuid}/webhooks/{source}");
        assert_eq!(route.webhook_source, None);
    }

    #[test]
    fn other_routes_carry_no_sync_attributes() {
        let route = request_route("GET", "/healthcheck");

        assert_eq!(route.otel_path, "/healthcheck");
        assert_eq!(route.tenant, None);
        assert_eq!(request_route("GET", "/").otel_path, "/");
    }
}
