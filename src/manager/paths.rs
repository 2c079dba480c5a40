// Resource paths relative to the cluster endpoint.

use urlencoding::encode;

pub const SERVICES_PATH: &str = "services/";
pub const COMPONENTS_PATH: &str = "components/";
pub const NAMENODE_PATH: &str = "services/HDFS/components/NAMENODE";

pub fn service_path(service: &str) -> String {
    format!("services/{}", encode(service))
}

pub fn component_path(component: &str) -> String {
    format!("components/{}", encode(component))
}

pub fn host_components_path(host: &str) -> String {
    format!("hosts/{}/host_components/", encode(host))
}

pub fn host_component_path(host: &str, component: &str) -> String {
    format!("hosts/{}/host_components/{}", encode(host), encode(component))
}
