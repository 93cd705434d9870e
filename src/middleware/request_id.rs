//! Request ID middleware for request tracing

use axum::http::{HeaderMap, HeaderName};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header name for request ID, also forwarded to the generative API
pub const X_REQUEST_ID: &str = "x-request-id";

/// Set a UUID v4 request id when the caller sent none, and echo it on the
/// response.
pub fn request_id_layer() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let header_name = HeaderName::from_static(X_REQUEST_ID);

    (
        SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(header_name),
    )
}

pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> Option<&str> {
        self.get(X_REQUEST_ID)?.to_str().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(headers.request_id(), None);

        headers.insert(X_REQUEST_ID, "req-42".parse().unwrap());
        assert_eq!(headers.request_id(), Some("req-42"));
    }
}
