//! Request correlation.
//!
//! # Responsibilities
//! - Assign a UUID to every request that arrives without an `x-request-id`
//! - Echo the id back on the response
//!
//! # Design Decisions
//! - Id added as the outermost layer so the trace span can carry it
//! - A caller-supplied id is kept as is

use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tracing::Span;

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that assigns missing request ids.
pub fn set_request_id() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer that copies the request id onto the response.
pub fn propagate_request_id() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Span for one HTTP request, tagged with its id.
pub fn make_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = request.request_id().unwrap_or("-"),
    )
}

/// Request id previously assigned by [`set_request_id`], if any.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
    }
}
