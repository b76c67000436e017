//! Request ids and response header helpers.

use salvo::{
    http::{StatusCode, header::HeaderValue},
    prelude::Response,
};
use tracing::warn;
use uuid::Uuid;

pub(super) const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is echoed back.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuse the caller's id when it is usable, otherwise mint a v7 uuid.
pub(super) fn resolve_request_id(header_value: Option<String>) -> String {
    header_value
        .map(|value| value.trim().to_owned())
        .filter(|value| is_usable(value))
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

fn is_usable(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|byte| byte.is_ascii_graphic())
}

pub(super) fn set_request_id_header(res: &mut Response, request_id: &str) {
    match HeaderValue::from_str(request_id) {
        Ok(value) => {
            res.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Err(source) => warn!(request_id, "request id is not a valid header value: {source}"),
    }
}

pub(super) fn response_status_or_ok(status_code: Option<StatusCode>) -> StatusCode {
    status_code.unwrap_or(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_id_is_echoed_trimmed() {
        assert_eq!(resolve_request_id(Some(" abc-123 ".to_owned())), "abc-123");
    }

    #[test]
    fn blank_or_missing_id_is_generated() {
        assert!(Uuid::parse_str(&resolve_request_id(Some("   ".to_owned()))).is_ok());
        assert!(Uuid::parse_str(&resolve_request_id(None)).is_ok());
    }

    #[test]
    fn oversized_or_spaced_ids_are_replaced() {
        let oversized = "x".repeat(MAX_REQUEST_ID_LEN + 1);

        assert_ne!(resolve_request_id(Some(oversized.clone())), oversized);
        assert_ne!(resolve_request_id(Some("a b".to_owned())), "a b");
    }
}
