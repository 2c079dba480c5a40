// Package manager maps lifecycle operations onto the manager's REST resources.

mod paths;
mod payload;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::audit::AuditSink;
use crate::error::OrchestrationError;
use crate::gateway::{Gateway, GatewayError, Response};
use crate::model::{DesiredState, ObservedState, ResourceIdentity, TransitionRequest};

pub use paths::{
    component_path, host_component_path, host_components_path, service_path, COMPONENTS_PATH,
    NAMENODE_PATH, SERVICES_PATH,
};
use payload::{ComponentItem, HostComponentItem, Items, NameNodeItem, ServiceItem};

const MAX_DETAIL_LEN: usize = 256;
const LIVE_NODES_FIELD: &str = "metrics/dfs/namenode/LiveNodes";

/// Typed access to the manager's resources on top of a [`Gateway`].
///
/// Every mutating call is written to the audit sink before it is sent.
#[derive(Clone)]
pub struct ManagerApi {
    gateway: Arc<dyn Gateway>,
    audit: Arc<dyn AuditSink>,
}

impl ManagerApi {
    pub fn new(gateway: Arc<dyn Gateway>, audit: Arc<dyn AuditSink>) -> Self {
        Self { gateway, audit }
    }

    /// Names of all services installed on the cluster.
    pub async fn list_services(&self) -> Result<Vec<String>, OrchestrationError> {
        let items: Items<ServiceItem> = self.read_json(SERVICES_PATH).await?;
        Ok(items
            .items
            .into_iter()
            .filter_map(|i| i.info.service_name)
            .collect())
    }

    /// `(component, owning service)` pairs for every component on the cluster.
    pub async fn list_components(&self) -> Result<Vec<(String, String)>, OrchestrationError> {
        let items: Items<ComponentItem> = self.read_json(COMPONENTS_PATH).await?;
        Ok(items
            .items
            .into_iter()
            .filter_map(|i| Some((i.info.component_name?, i.info.service_name.unwrap_or_default())))
            .collect())
    }

    /// Names of the components placed on `host`. An unknown host has none.
    pub async fn host_components(&self, host: &str) -> Result<Vec<String>, OrchestrationError> {
        let path = host_components_path(host);
        let resp = self.gateway.get(&path).await?;
        if resp.status == 404 {
            return Ok(Vec::new());
        }
        let items: Items<HostComponentItem> = Self::decode(&path, resp)?;
        Ok(items
            .items
            .into_iter()
            .filter_map(|i| i.roles.component_name)
            .collect())
    }

    /// Reads the state the manager currently reports for `identity`.
    pub async fn observe(
        &self,
        identity: &ResourceIdentity,
    ) -> Result<ObservedState, OrchestrationError> {
        let raw = match identity {
            ResourceIdentity::Service(name) => {
                let path = format!("{}?fields=ServiceInfo/state", service_path(name));
                let item: ServiceItem = self.read_json(&path).await?;
                item.info.state
            }
            ResourceIdentity::Component { name, host } => {
                let path = format!("{}?fields=HostRoles/state", host_component_path(host, name));
                let item: HostComponentItem = self.read_json(&path).await?;
                item.roles.state
            }
        };
        Self::parse_state(&identity.to_string(), raw)
    }

    /// Cluster-wide state of a component, aggregated by the manager over its placements.
    pub async fn component_state(&self, name: &str) -> Result<ObservedState, OrchestrationError> {
        let item: ComponentItem = self.read_json(&component_path(name)).await?;
        Self::parse_state(&format!("component {}", name), item.info.state)
    }

    /// Hosts whose DataNode the NameNode reports as live, sorted.
    pub async fn live_nodes(&self) -> Result<Vec<String>, OrchestrationError> {
        let path = format!("{}?fields={}", NAMENODE_PATH, LIVE_NODES_FIELD);
        let item: NameNodeItem = self.read_json(&path).await?;
        let unexpected = |detail: String| OrchestrationError::UnexpectedResponse {
            path: path.clone(),
            status: 200,
            detail,
        };

        let raw = item
            .metrics
            .and_then(|m| m.dfs)
            .and_then(|d| d.namenode)
            .and_then(|n| n.live_nodes)
            .ok_or_else(|| unexpected("no LiveNodes metric, is the NameNode running?".to_string()))?;
        let nodes: BTreeMap<String, Value> = match raw {
            Value::String(text) => serde_json::from_str(&text),
            other => serde_json::from_value(other),
        }
        .map_err(|e| unexpected(e.to_string()))?;

        let mut hosts: Vec<String> = nodes
            .into_keys()
            .map(|addr| match addr.rsplit_once(':') {
                Some((host, _port)) => host.to_string(),
                None => addr,
            })
            .collect();
        hosts.sort();
        hosts.dedup();
        Ok(hosts)
    }

    /// Sends a single desired-state change. The caller inspects the status.
    pub async fn request_transition(
        &self,
        req: &TransitionRequest,
    ) -> Result<Response, GatewayError> {
        let (path, body) = match &req.identity {
            ResourceIdentity::Service(name) => (
                service_path(name),
                payload::service_state_body(&req.context, req.desired),
            ),
            ResourceIdentity::Component { name, host } => (
                host_component_path(host, name),
                payload::host_component_state_body(&req.context, req.desired),
            ),
        };
        self.note("PUT", &path, &req.context).await;
        self.gateway.put(&path, &body).await
    }

    /// Sends one desired-state change covering every service at once.
    pub async fn request_bulk(
        &self,
        desired: DesiredState,
        context: &str,
    ) -> Result<Response, GatewayError> {
        let body = payload::service_state_body(context, desired);
        self.note("PUT", SERVICES_PATH, context).await;
        self.gateway.put(SERVICES_PATH, &body).await
    }

    /// Creates a placement of `component` on `host`.
    pub async fn create_placement(
        &self,
        component: &str,
        host: &str,
    ) -> Result<Response, GatewayError> {
        let path = host_component_path(host, component);
        self.note("POST", &path, &format!("Add {} to {}", component, host))
            .await;
        self.gateway.post(&path, None).await
    }

    /// Deletes the placement of `component` on `host`.
    pub async fn delete_placement(
        &self,
        component: &str,
        host: &str,
    ) -> Result<Response, GatewayError> {
        let path = host_component_path(host, component);
        self.note("DELETE", &path, &format!("Delete {} from {}", component, host))
            .await;
        self.gateway.delete(&path).await
    }

    async fn note(&self, method: &str, path: &str, context: &str) {
        self.audit
            .note(&format!("{} {}: {}", method, path, context))
            .await;
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, OrchestrationError> {
        let resp = self.gateway.get(path).await?;
        Self::decode(path, resp)
    }

    fn decode<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T, OrchestrationError> {
        if !resp.is_success() {
            return Err(OrchestrationError::UnexpectedResponse {
                path: path.to_string(),
                status: resp.status,
                detail: detail(&resp.body),
            });
        }
        let status = resp.status;
        serde_json::from_value(resp.body).map_err(|e| OrchestrationError::UnexpectedResponse {
            path: path.to_string(),
            status,
            detail: e.to_string(),
        })
    }

    fn parse_state(
        resource: &str,
        raw: Option<String>,
    ) -> Result<ObservedState, OrchestrationError> {
        let raw = raw.unwrap_or_default();
        raw.parse()
            .map_err(|source| OrchestrationError::UnrecognizedState {
                resource: resource.to_string(),
                source,
            })
    }
}

/// Short printable form of a response body for error messages.
pub(crate) fn detail(body: &Value) -> String {
    let mut text = match body {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.len() > MAX_DETAIL_LEN {
        let mut cut = MAX_DETAIL_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
