//! W3C trace context from inbound webhook headers.

use opentelemetry::{Context, global, propagation::Extractor, trace::TraceContextExt as _};
use salvo::http::{HeaderMap, HeaderName};

/// Remote parent carried by the request, if its headers hold a valid span context.
pub(super) fn extract_parent_context(headers: &HeaderMap) -> Option<Context> {
    let context = global::get_text_map_propagator(|propagator| {
        // Start empty so a missing header never adopts the current span.
        propagator.extract_with_context(&Context::new(), &Headers(headers))
    });

    context
        .span()
        .span_context()
        .is_valid()
        .then_some(context)
}

struct Headers<'a>(&'a HeaderMap);

impl Extractor for Headers<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use salvo::http::header::HeaderValue;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn traceparent_header_becomes_the_parent() -> TestResult {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let mut headers = HeaderMap::new();
        headers.insert(
            "traceparent",
            HeaderValue::from_static("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
        );

        let context = extract_parent_context(&headers).ok_or("expected a parent context")?;

        assert_eq!(
            context.span().span_context().trace_id().to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );

        Ok(())
    }

    #[test]
    fn missing_headers_yield_no_parent() {
        assert!(extract_parent_context(&HeaderMap::new()).is_none());
    }
}
