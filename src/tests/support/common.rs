// Common fixtures: a small seeded cluster plus fast timings.

use std::sync::Arc;
use std::time::Duration;

use super::audit::MemoryAudit;
use super::stub::StubManager;
use crate::inventory::InventoryCache;
use crate::manager::ManagerApi;
use crate::model::{LifecycleTimeouts, RestartTimings};
use crate::poller::StatePoller;

pub const POLL: Duration = Duration::from_millis(10);
pub const TIMEOUT: Duration = Duration::from_secs(1);
pub const RETRY_DELAY: Duration = Duration::from_millis(5);
pub const RETRY_BUDGET: u32 = 2;

pub fn timeouts() -> LifecycleTimeouts {
    LifecycleTimeouts::new(POLL, TIMEOUT).with_retries(RETRY_BUDGET, RETRY_DELAY)
}

pub fn restart_timings() -> RestartTimings {
    RestartTimings {
        poll_interval: POLL,
        per_service_timeout: TIMEOUT,
        settle_delay: Duration::from_millis(20),
        request_retry_budget: RETRY_BUDGET,
        retry_delay: RETRY_DELAY,
    }
}

/// Three hosts, three started services and a handful of placed components.
pub fn seeded_cluster() -> Arc<StubManager> {
    let stub = Arc::new(StubManager::new());
    for service in ["HDFS", "YARN", "HIVE"] {
        stub.add_service(service, "STARTED");
    }
    for (component, service) in [
        ("NAMENODE", "HDFS"),
        ("DATANODE", "HDFS"),
        ("NFS_GATEWAY", "HDFS"),
        ("RESOURCEMANAGER", "YARN"),
        ("HIVE_SERVER", "HIVE"),
        ("WEBHCAT_SERVER", "HIVE"),
    ] {
        stub.add_component(component, service);
    }
    for host in ["node1", "node2", "node3"] {
        stub.add_host(host);
        stub.place(host, "DATANODE", "STARTED");
    }
    stub.place("node1", "NAMENODE", "STARTED");
    stub.place("node1", "NFS_GATEWAY", "STARTED");
    stub.place("node2", "RESOURCEMANAGER", "STARTED");
    stub.place("node2", "HIVE_SERVER", "STARTED");
    stub.place("node2", "WEBHCAT_SERVER", "STARTED");
    stub
}

pub fn api_for(stub: &Arc<StubManager>) -> (ManagerApi, Arc<MemoryAudit>) {
    let audit = Arc::new(MemoryAudit::new());
    (ManagerApi::new(stub.clone(), audit.clone()), audit)
}

/// Poller over `stub` with the inventory already loaded from it.
pub async fn poller_for(stub: &Arc<StubManager>) -> (StatePoller, Arc<MemoryAudit>) {
    let (api, audit) = api_for(stub);
    let inventory = Arc::new(InventoryCache::empty());
    inventory.refresh(&api).await.unwrap();
    (StatePoller::new(api, inventory), audit)
}

pub fn service_path(name: &str) -> String {
    format!("services/{}", name)
}

pub fn placement_path(host: &str, component: &str) -> String {
    format!("hosts/{}/host_components/{}", host, component)
}
