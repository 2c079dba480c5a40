// HTTP front for StubManager, serving the manager's REST layout over axum.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
    response::{IntoResponse, Response as AxumResponse},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::stub::StubManager;
use crate::gateway::Gateway;

pub const CLUSTER_PREFIX: &str = "/api/v1/clusters/testcl/";

/// Request as seen on the wire.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path_and_query: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

pub struct ManagerServer {
    addr: String,
    stub: Arc<StubManager>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    delay_ms: Arc<AtomicU64>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ManagerServer {
    pub async fn start(stub: Arc<StubManager>) -> Self {
        let seen: Arc<Mutex<Vec<SeenRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let delay_ms = Arc::new(AtomicU64::new(0));

        let handler = {
            let stub = stub.clone();
            let seen = seen.clone();
            let delay_ms = delay_ms.clone();
            move |req: Request| {
                let stub = stub.clone();
                let seen = seen.clone();
                let delay_ms = delay_ms.clone();
                async move { serve(stub, seen, delay_ms, req).await }
            }
        };
        let router = Router::new().fallback(handler);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("127.0.0.1:{}", addr.port());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, router);
            tokio::select! {
                _ = server => {},
                _ = shutdown_rx => {},
            }
        });

        Self {
            addr: addr_str,
            stub,
            seen,
            delay_ms,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn stub(&self) -> &Arc<StubManager> {
        &self.stub
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// Delays every subsequent response.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

async fn serve(
    stub: Arc<StubManager>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    delay_ms: Arc<AtomicU64>,
    req: Request,
) -> AxumResponse {
    let method = req.method().clone();
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let headers = req
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .unwrap_or_default()
        .to_vec();

    seen.lock().unwrap().push(SeenRequest {
        method: method.to_string(),
        path_and_query: path_and_query.clone(),
        headers,
        body: body.clone(),
    });

    let delay = delay_ms.load(Ordering::Relaxed);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let Some(path) = path_and_query.strip_prefix(CLUSTER_PREFIX) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let json_body: Option<Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };

    let result = match method {
        Method::GET => stub.get(path).await,
        Method::PUT => stub.put(path, &json_body.unwrap_or(Value::Null)).await,
        Method::POST => stub.post(path, json_body.as_ref()).await,
        Method::DELETE => stub.delete(path).await,
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };

    match result {
        Ok(resp) => {
            let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let payload = if resp.body.is_null() {
                Vec::new()
            } else {
                serde_json::to_vec(&resp.body).unwrap()
            };
            axum::http::Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(payload))
                .unwrap()
        }
        Err(_) => StatusCode::BAD_GATEWAY.into_response(),
    }
}
