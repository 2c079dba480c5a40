//! Hyper HTTP client configuration for control-plane requests.
//!
//! The manager is a single endpoint polled at a low rate, so the pool is small:
//! - Max idle connections per host: 8
//! - Max idle connection duration: 30s
//! - Connection timeout: 3s
//! - TCP keep-alive: 30s
//! - TCP_NODELAY: enabled

use std::time::Duration;

use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::dns::GaiResolver;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::warn;

/// Connection pool configuration constants.
pub const CONNS_PER_HOST: usize = 8;
pub const MAX_IDLE_CONN_DURATION: Duration = Duration::from_secs(30);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

pub type HyperClient =
    Client<HttpsConnector<HttpConnector<GaiResolver>>, BoxBody<Bytes, hyper::Error>>;

/// Creates a Hyper HTTP client able to talk to both plain and TLS managers.
///
/// Uses `BoxBody` for requests (supports Empty/Full) and `Incoming` for responses.
/// Transport-level concerns (pooling, keep-alive, canceled-request retry) live
/// here and nowhere else. Falls back to the bundled webpki roots when the
/// platform store has no usable certificates.
pub fn create_client() -> HyperClient {
    let resolver = GaiResolver::new();

    let mut http_connector = HttpConnector::new_with_resolver(resolver);
    http_connector.set_nodelay(true);
    http_connector.set_keepalive(Some(Duration::from_secs(30)));
    http_connector.set_connect_timeout(Some(CONNECT_TIMEOUT));
    http_connector.enforce_http(false);

    let roots = match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            warn!(
                component = "http",
                event = "native_roots_unavailable",
                error = %e,
                "using bundled root certificates"
            );
            hyper_rustls::HttpsConnectorBuilder::new().with_webpki_roots()
        }
    };
    let tls = roots
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(MAX_IDLE_CONN_DURATION)
        .pool_max_idle_per_host(CONNS_PER_HOST)
        .retry_canceled_requests(true)
        .build(tls)
}
