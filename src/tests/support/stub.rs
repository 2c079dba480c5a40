// In-memory cluster manager used by unit and scenario tests.
//
// Resources are keyed by their path without the query string
// (`services/HDFS`, `hosts/node1/host_components/NFS_GATEWAY`). An accepted
// state change reports a transit state for `lag` reads, then the target.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::gateway::{Gateway, GatewayError, Response};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct Pending {
    target: String,
    transit: String,
    reads_left: u32,
}

#[derive(Debug, Clone)]
struct Resource {
    state: String,
    pending: Option<Pending>,
}

impl Resource {
    fn new(state: &str) -> Self {
        Self {
            state: state.to_string(),
            pending: None,
        }
    }
}

#[derive(Default)]
struct StubState {
    resources: BTreeMap<String, Resource>,
    components: BTreeMap<String, String>,
    hosts: BTreeSet<String>,
    lag: u32,
    stuck: HashSet<String>,
    transit_override: HashMap<String, String>,
    rejected_puts: HashMap<String, (u32, u16)>,
    rejected_targets: HashMap<(String, String), u16>,
    cancel_hooks: Vec<(&'static str, String, CancellationToken)>,
    live_nodes: Option<Vec<String>>,
    failing_posts: HashSet<String>,
    failing_deletes: HashSet<String>,
    broken_paths: HashSet<String>,
    next_request_id: u64,
    calls: Vec<Call>,
}

pub struct StubManager {
    inner: Mutex<StubState>,
}

impl Default for StubManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StubManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StubState {
                lag: 1,
                next_request_id: 1,
                ..StubState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StubState> {
        self.inner.lock().unwrap()
    }

    pub fn add_service(&self, name: &str, state: &str) {
        self.lock()
            .resources
            .insert(format!("services/{}", name), Resource::new(state));
    }

    pub fn add_component(&self, name: &str, service: &str) {
        self.lock()
            .components
            .insert(name.to_string(), service.to_string());
    }

    pub fn add_host(&self, host: &str) {
        self.lock().hosts.insert(host.to_string());
    }

    pub fn place(&self, host: &str, component: &str, state: &str) {
        let mut inner = self.lock();
        inner.hosts.insert(host.to_string());
        inner
            .resources
            .insert(placement_key(host, component), Resource::new(state));
    }

    /// Number of reads answered with the transit state before the target shows up.
    pub fn set_lag(&self, reads: u32) {
        self.lock().lag = reads;
    }

    /// Accepted changes on `path` never converge.
    pub fn make_stuck(&self, path: &str) {
        self.lock().stuck.insert(path.to_string());
    }

    /// State reported for `path` while a change is in flight.
    pub fn set_transit(&self, path: &str, state: &str) {
        self.lock()
            .transit_override
            .insert(path.to_string(), state.to_string());
    }

    /// The next `times` PUTs to `path` are answered with `status`.
    pub fn reject_puts(&self, path: &str, times: u32, status: u16) {
        self.lock()
            .rejected_puts
            .insert(path.to_string(), (times, status));
    }

    /// Every PUT to `path` asking for `target` is answered with `status`.
    pub fn reject_target(&self, path: &str, target: &str, status: u16) {
        self.lock()
            .rejected_targets
            .insert((path.to_string(), target.to_string()), status);
    }

    /// Cancels `token` once a `method` call to `path` has been served.
    pub fn cancel_after(&self, method: &'static str, path: &str, token: CancellationToken) {
        self.lock()
            .cancel_hooks
            .push((method, path.to_string(), token));
    }

    /// DataNode addresses reported by the NameNode metrics, as `host:port`.
    pub fn set_live_nodes(&self, nodes: &[&str]) {
        self.lock().live_nodes = Some(nodes.iter().map(|n| n.to_string()).collect());
    }

    pub fn fail_post(&self, path: &str) {
        self.lock().failing_posts.insert(path.to_string());
    }

    pub fn fail_delete(&self, path: &str) {
        self.lock().failing_deletes.insert(path.to_string());
    }

    /// Every request to `path` fails at the transport level.
    pub fn break_path(&self, path: &str) {
        self.lock().broken_paths.insert(path.to_string());
    }

    /// Forces the current state of `path`, dropping any change in flight.
    pub fn set_state(&self, path: &str, state: &str) {
        self.lock()
            .resources
            .insert(path.to_string(), Resource::new(state));
    }

    pub fn state_of(&self, path: &str) -> Option<String> {
        self.lock().resources.get(path).map(|r| r.state.clone())
    }

    pub fn is_placed(&self, host: &str, component: &str) -> bool {
        self.lock()
            .resources
            .contains_key(&placement_key(host, component))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method == method && strip_query(&c.path) == path)
            .count()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method != "GET")
            .cloned()
            .collect()
    }

    fn record(&self, method: &'static str, path: &str, body: Option<&Value>) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        inner.calls.push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        for (hook_method, hook_path, token) in &inner.cancel_hooks {
            if *hook_method == method && hook_path == strip_query(path) {
                token.cancel();
            }
        }
        if inner.broken_paths.contains(strip_query(path)) {
            return Err(GatewayError::Connection {
                method: method.to_string(),
                url: path.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

fn placement_key(host: &str, component: &str) -> String {
    format!("hosts/{}/host_components/{}", host, component)
}

fn strip_query(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

fn not_found(path: &str) -> Response {
    Response::new(
        404,
        json!({ "status": 404, "message": format!("The requested resource doesn't exist: {}", path) }),
    )
}

fn transit_for(current: &str, target: &str) -> &'static str {
    match (current, target) {
        ("INIT", "INSTALLED") | ("INSTALL_FAILED", "INSTALLED") => "INSTALLING",
        (_, "INSTALLED") => "STOPPING",
        _ => "STARTING",
    }
}

impl StubState {
    /// Advances an in-flight change by one read and returns the visible state.
    fn read(&mut self, key: &str) -> Option<String> {
        let stuck = self.stuck.contains(key);
        let res = self.resources.get_mut(key)?;
        if let Some(pending) = res.pending.as_mut() {
            if stuck || pending.reads_left > 0 {
                pending.reads_left = pending.reads_left.saturating_sub(1);
                res.state = pending.transit.clone();
            } else {
                res.state = pending.target.clone();
                res.pending = None;
            }
        }
        Some(res.state.clone())
    }

    fn begin(&mut self, key: &str, target: &str) -> bool {
        let lag = self.lag;
        let transit_override = self.transit_override.get(key).cloned();
        let Some(res) = self.resources.get_mut(key) else {
            return false;
        };
        if res.pending.is_none() && res.state == target {
            return false;
        }
        let transit = transit_override.unwrap_or_else(|| transit_for(&res.state, target).to_string());
        res.pending = Some(Pending {
            target: target.to_string(),
            transit,
            reads_left: lag,
        });
        true
    }

    fn accepted(&mut self) -> Response {
        let id = self.next_request_id;
        self.next_request_id += 1;
        Response::new(202, json!({ "Requests": { "id": id, "status": "Accepted" } }))
    }

    fn take_rejection(&mut self, key: &str) -> Option<Response> {
        let entry = self.rejected_puts.get_mut(key)?;
        if entry.0 == 0 {
            return None;
        }
        entry.0 -= 1;
        let status = entry.1;
        Some(Response::new(
            status,
            json!({ "status": status, "message": "Another request is in progress" }),
        ))
    }
}

#[async_trait::async_trait]
impl Gateway for StubManager {
    async fn get(&self, path: &str) -> Result<Response, GatewayError> {
        self.record("GET", path, None)?;
        let key = strip_query(path);
        let mut inner = self.lock();

        if key == "services/" {
            let items: Vec<Value> = inner
                .resources
                .keys()
                .filter_map(|k| k.strip_prefix("services/"))
                .map(|name| json!({ "ServiceInfo": { "service_name": name } }))
                .collect();
            return Ok(Response::new(200, json!({ "items": items })));
        }

        if key == "components/" {
            let items: Vec<Value> = inner
                .components
                .iter()
                .map(|(name, service)| {
                    json!({ "ServiceComponentInfo": { "component_name": name, "service_name": service } })
                })
                .collect();
            return Ok(Response::new(200, json!({ "items": items })));
        }

        if key == "services/HDFS/components/NAMENODE" {
            let metrics = match &inner.live_nodes {
                Some(nodes) => {
                    let live: serde_json::Map<String, Value> = nodes
                        .iter()
                        .map(|n| (n.clone(), json!({ "adminState": "In Service" })))
                        .collect();
                    json!({ "dfs": { "namenode": { "LiveNodes": Value::Object(live).to_string() } } })
                }
                None => json!({}),
            };
            return Ok(Response::new(
                200,
                json!({
                    "ServiceComponentInfo": { "component_name": "NAMENODE", "service_name": "HDFS" },
                    "metrics": metrics,
                }),
            ));
        }

        if let Some(name) = key.strip_prefix("services/") {
            return Ok(match inner.read(key) {
                Some(state) => Response::new(
                    200,
                    json!({ "ServiceInfo": { "service_name": name, "state": state } }),
                ),
                None => not_found(key),
            });
        }

        if let Some(name) = key.strip_prefix("components/") {
            let Some(service) = inner.components.get(name).cloned() else {
                return Ok(not_found(key));
            };
            let suffix = format!("/host_components/{}", name);
            let states: Vec<String> = inner
                .resources
                .iter()
                .filter(|(k, _)| k.ends_with(&suffix))
                .map(|(_, r)| r.state.clone())
                .collect();
            let state = if states.iter().any(|s| s == "STARTED") {
                "STARTED"
            } else {
                "INSTALLED"
            };
            return Ok(Response::new(
                200,
                json!({ "ServiceComponentInfo": {
                    "component_name": name,
                    "service_name": service,
                    "state": state,
                } }),
            ));
        }

        if let Some(rest) = key.strip_prefix("hosts/") {
            let (host, component) = match rest.split_once("/host_components/") {
                Some(parts) => parts,
                None => return Ok(not_found(key)),
            };
            if !inner.hosts.contains(host) {
                return Ok(not_found(key));
            }
            if component.is_empty() {
                let prefix = format!("hosts/{}/host_components/", host);
                let items: Vec<Value> = inner
                    .resources
                    .iter()
                    .filter_map(|(k, r)| Some((k.strip_prefix(&prefix)?, r)))
                    .map(|(c, r)| json!({ "HostRoles": { "component_name": c, "state": r.state } }))
                    .collect();
                return Ok(Response::new(200, json!({ "items": items })));
            }
            return Ok(match inner.read(key) {
                Some(state) => Response::new(
                    200,
                    json!({ "HostRoles": { "component_name": component, "host_name": host, "state": state } }),
                ),
                None => not_found(key),
            });
        }

        Ok(not_found(key))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Response, GatewayError> {
        self.record("PUT", path, Some(body))?;
        let key = strip_query(path).to_string();
        let mut inner = self.lock();

        if let Some(rejection) = inner.take_rejection(&key) {
            return Ok(rejection);
        }

        let target = body
            .pointer("/Body/ServiceInfo/state")
            .or_else(|| body.pointer("/HostRoles/state"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let Some(target) = target else {
            return Ok(Response::new(
                400,
                json!({ "status": 400, "message": "Invalid desired state" }),
            ));
        };
        if let Some(status) = inner.rejected_targets.get(&(key.clone(), target.clone())) {
            let status = *status;
            return Ok(Response::new(
                status,
                json!({ "status": status, "message": "Server Error" }),
            ));
        }

        if key == "services/" {
            let services: Vec<String> = inner
                .resources
                .keys()
                .filter(|k| k.starts_with("services/"))
                .cloned()
                .collect();
            let mut changed = false;
            for service in services {
                changed |= inner.begin(&service, &target);
            }
            return Ok(if changed {
                inner.accepted()
            } else {
                Response::new(200, Value::Null)
            });
        }

        if !inner.resources.contains_key(&key) {
            return Ok(not_found(&key));
        }
        Ok(if inner.begin(&key, &target) {
            inner.accepted()
        } else {
            Response::new(200, Value::Null)
        })
    }

    async fn post(&self, path: &str, body: Option<&Value>) -> Result<Response, GatewayError> {
        self.record("POST", path, body)?;
        let key = strip_query(path).to_string();
        let mut inner = self.lock();

        if inner.failing_posts.contains(&key) {
            return Ok(Response::new(
                500,
                json!({ "status": 500, "message": "Server Error" }),
            ));
        }
        let host = key
            .strip_prefix("hosts/")
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default()
            .to_string();
        if !inner.hosts.contains(&host) {
            return Ok(not_found(&key));
        }
        if inner.resources.contains_key(&key) {
            return Ok(Response::new(
                409,
                json!({ "status": 409, "message": "Attempted to create a host_component which already exists" }),
            ));
        }
        inner.resources.insert(key, Resource::new("INIT"));
        Ok(Response::new(201, Value::Null))
    }

    async fn delete(&self, path: &str) -> Result<Response, GatewayError> {
        self.record("DELETE", path, None)?;
        let key = strip_query(path).to_string();
        let mut inner = self.lock();

        if inner.failing_deletes.contains(&key) {
            return Ok(Response::new(
                500,
                json!({ "status": 500, "message": "Server Error" }),
            ));
        }
        Ok(match inner.resources.remove(&key) {
            Some(_) => Response::new(200, Value::Null),
            None => not_found(&key),
        })
    }
}
