use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use bytes::Bytes;
use governor::{Quota, RateLimiter};
use hyper::{Method, Uri};
use serde_json::Value;
use tracing::Instrument;

use super::hyper_impl::make_request;
use super::trace as gateway_trace;
use super::{Gateway, GatewayError, Response};
use crate::config::Manager;
use crate::http::{create_client, HyperClient};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RATE: u32 = 20;
const DEFAULT_REQUESTED_BY: &str = "ambari";

type DirectLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Gateway implementation talking HTTP to the cluster manager.
pub struct ManagerGateway {
    endpoint: String,
    headers: Vec<(&'static str, String)>,
    timeout: Duration,
    client: HyperClient,
    limiter: DirectLimiter,
}

impl ManagerGateway {
    /// Creates a new gateway from the manager section of the configuration.
    pub fn new(cfg: Option<&Manager>) -> Result<Self> {
        let cfg = cfg.context("manager configuration is required")?;

        let endpoint = Self::endpoint(cfg)?;

        let rate = cfg.rate.unwrap_or(DEFAULT_RATE);
        let rate = NonZeroU32::new(rate).context("manager.rate must be greater than zero")?;
        let limiter = RateLimiter::direct(Quota::per_second(rate));

        let client = create_client();

        let mut headers = vec![
            (
                "X-Requested-By",
                cfg.requested_by
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REQUESTED_BY.to_string()),
            ),
            ("Content-Type", "application/json".to_string()),
            ("Accept", "application/json".to_string()),
        ];
        if let Some(user) = cfg.username.as_deref() {
            let password = cfg.password.as_deref().unwrap_or("");
            let token = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", user, password));
            headers.push(("Authorization", format!("Basic {}", token)));
        }

        Ok(Self {
            endpoint,
            headers,
            timeout: cfg.timeout.unwrap_or(DEFAULT_TIMEOUT),
            client,
            limiter,
        })
    }

    /// Base URL of the cluster resource, always ending with a slash.
    fn endpoint(cfg: &Manager) -> Result<String> {
        let scheme = cfg.scheme.as_deref().unwrap_or("http");
        let host = cfg.host.as_deref().context("manager.host must be configured")?;
        let cluster = cfg
            .cluster
            .as_deref()
            .context("manager.cluster must be configured")?;

        let normalized_host = if host == "localhost" || host.starts_with("localhost:") {
            host.replacen("localhost", "127.0.0.1", 1)
        } else {
            host.to_string()
        };

        let endpoint = format!(
            "{}://{}/api/v1/clusters/{}/",
            scheme,
            normalized_host,
            urlencoding::encode(cluster)
        );
        url::Url::parse(&endpoint)
            .with_context(|| format!("invalid manager endpoint {}", endpoint))?;
        Ok(endpoint)
    }

    /// Cluster endpoint requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.endpoint
    }

    fn uri(&self, path: &str) -> Result<Uri, GatewayError> {
        let url = format!("{}{}", self.endpoint, path.trim_start_matches('/'));
        url.parse().map_err(|e: hyper::http::uri::InvalidUri| GatewayError::InvalidUrl {
            url,
            reason: e.to_string(),
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, GatewayError> {
        // Wait for rate limiter
        self.limiter.until_ready().await;

        let uri = self.uri(path)?;
        let body = body.map(|b| Bytes::from(b.to_string()));
        let span = gateway_trace::start_request_span(&method, path);
        crate::metrics::inc_gateway_requests(method.as_str());

        let result = make_request(
            &self.client,
            method,
            uri,
            &self.headers,
            body,
            self.timeout,
        )
        .instrument(span.clone())
        .await;

        match result {
            Ok((status, raw)) => {
                gateway_trace::record_response_in_span(&span, status, raw.len());
                Ok(Response::from_bytes(status, &raw))
            }
            Err(e) => {
                gateway_trace::record_error_in_span(&span, &e);
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl Gateway for ManagerGateway {
    async fn get(&self, path: &str) -> Result<Response, GatewayError> {
        self.send(Method::GET, path, None).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Response, GatewayError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn post(&self, path: &str, body: Option<&Value>) -> Result<Response, GatewayError> {
        self.send(Method::POST, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<Response, GatewayError> {
        self.send(Method::DELETE, path, None).await
    }
}
