//! Tracing spans for manager round trips.
//!
//! Every request gets a span carrying method, path, and (once known) status
//! code and response size, so a failing transition can be followed request by
//! request in the logs.

use hyper::Method;
use tracing::{field, Level, Span};

pub const ATTR_HTTP_STATUS_CODE_KEY: &str = "http.status_code";
pub const ATTR_HTTP_RESPONSE_SIZE_KEY: &str = "http.response_size";

/// Creates a new span for an outbound manager request (client-side span).
pub fn start_request_span(method: &Method, path: &str) -> Span {
    tracing::span!(
        Level::DEBUG,
        "manager",
        http.method = %method,
        http.path = path,
        http.status_code = field::Empty,
        http.response_size = field::Empty,
        error = field::Empty,
    )
}

/// Records HTTP response information in the span.
pub fn record_response_in_span(span: &Span, status_code: u16, response_size: usize) {
    span.record(ATTR_HTTP_STATUS_CODE_KEY, status_code);
    span.record(ATTR_HTTP_RESPONSE_SIZE_KEY, response_size);
}

/// Records an error in the span.
pub fn record_error_in_span(span: &Span, err: &dyn std::error::Error) {
    span.record("error", true);
    tracing::debug!(parent: span, error = %err, "manager request error");
}
