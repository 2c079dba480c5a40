// Request bodies and response shapes of the manager's REST API.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::model::DesiredState;

#[derive(Debug, Deserialize)]
pub struct Items<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceItem {
    #[serde(rename = "ServiceInfo")]
    pub info: ServiceInfo,
}

#[derive(Debug, Deserialize)]
pub struct ServiceInfo {
    pub service_name: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentItem {
    #[serde(rename = "ServiceComponentInfo")]
    pub info: ComponentInfo,
}

#[derive(Debug, Deserialize)]
pub struct ComponentInfo {
    pub component_name: Option<String>,
    pub service_name: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HostComponentItem {
    #[serde(rename = "HostRoles")]
    pub roles: HostRoles,
}

#[derive(Debug, Deserialize)]
pub struct HostRoles {
    pub component_name: Option<String>,
    pub state: Option<String>,
}

/// NameNode component with its `metrics/dfs/namenode` subtree.
#[derive(Debug, Deserialize)]
pub struct NameNodeItem {
    pub metrics: Option<NameNodeMetrics>,
}

#[derive(Debug, Deserialize)]
pub struct NameNodeMetrics {
    pub dfs: Option<Dfs>,
}

#[derive(Debug, Deserialize)]
pub struct Dfs {
    pub namenode: Option<NameNodeInfo>,
}

#[derive(Debug, Deserialize)]
pub struct NameNodeInfo {
    /// JSON object keyed by `host:port`, usually delivered as a string.
    #[serde(rename = "LiveNodes")]
    pub live_nodes: Option<Value>,
}

/// `{"RequestInfo": {...}, "Body": {"ServiceInfo": {"state": ...}}}`
pub fn service_state_body(context: &str, desired: DesiredState) -> Value {
    json!({
        "RequestInfo": { "context": context },
        "Body": { "ServiceInfo": { "state": desired.as_str() } }
    })
}

/// `{"RequestInfo": {...}, "HostRoles": {"state": ...}}`
pub fn host_component_state_body(context: &str, desired: DesiredState) -> Value {
    json!({
        "RequestInfo": { "context": context },
        "HostRoles": { "state": desired.as_str() }
    })
}
