//! Hyper-based implementation of a single manager round trip.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::{Method, Request, Uri};
use tokio::time::timeout;

use super::GatewayError;
use crate::http::HyperClient;

/// Makes a request with the given method, headers and optional body and
/// returns the status code together with the collected body bytes.
pub async fn make_request(
    client: &HyperClient,
    method: Method,
    uri: Uri,
    headers: &[(&'static str, String)],
    body: Option<Bytes>,
    timeout_duration: Duration,
) -> Result<(u16, Bytes), GatewayError> {
    let uri_str = uri.to_string();
    let method_str = method.to_string();

    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }

    let req_body: BoxBody<Bytes, hyper::Error> = match body {
        Some(body_bytes) => Full::new(body_bytes)
            .map_err(|never: std::convert::Infallible| match never {})
            .boxed(),
        None => Empty::<Bytes>::new()
            .map_err(|never: std::convert::Infallible| match never {})
            .boxed(),
    };

    let req = builder
        .body(req_body)
        .map_err(|e| GatewayError::InvalidUrl {
            url: uri_str.clone(),
            reason: e.to_string(),
        })?;

    let response = match timeout(timeout_duration, client.request(req)).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            tracing::debug!(
                uri = %uri_str,
                error = %e,
                error_debug = ?e,
                "Hyper client request failed"
            );
            return Err(GatewayError::Connection {
                method: method_str,
                url: uri_str,
                reason: e.to_string(),
            });
        }
        Err(_) => {
            tracing::warn!(
                uri = %uri_str,
                timeout = ?timeout_duration,
                "Request timed out"
            );
            return Err(GatewayError::Timeout {
                method: method_str,
                url: uri_str,
                timeout_ms: timeout_duration.as_millis(),
            });
        }
    };

    let status = response.status().as_u16();

    let (_, body_stream) = response.into_parts();
    let body_bytes = body_stream
        .collect()
        .await
        .map_err(|e| GatewayError::Connection {
            method: method_str,
            url: uri_str,
            reason: format!("failed to read response body: {}", e),
        })?
        .to_bytes();

    Ok((status, body_bytes))
}
