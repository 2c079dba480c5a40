//! Counters for orchestration events.
//!
//! Recorded through the `metrics` facade; without an installed recorder every
//! call is a no-op.

// Metric name constants
pub const GATEWAY_REQUESTS: &str = "ambarictl_gateway_requests_total";
pub const TRANSITION_REQUESTS: &str = "ambarictl_transition_requests_total";
pub const REQUEST_RETRIES: &str = "ambarictl_request_retries_total";
pub const POLL_TICKS: &str = "ambarictl_poll_ticks_total";
pub const CONVERGENCE_TIMEOUTS: &str = "ambarictl_convergence_timeouts_total";
pub const RELOCATIONS: &str = "ambarictl_relocations_total";
pub const INVENTORY_REFRESHES: &str = "ambarictl_inventory_refreshes_total";

pub fn inc_gateway_requests(method: &str) {
    metrics::counter!(GATEWAY_REQUESTS, "method" => method.to_owned()).increment(1);
}

pub fn inc_transition_requests(kind: &'static str) {
    metrics::counter!(TRANSITION_REQUESTS, "kind" => kind).increment(1);
}

pub fn inc_request_retries() {
    metrics::counter!(REQUEST_RETRIES).increment(1);
}

pub fn inc_poll_ticks() {
    metrics::counter!(POLL_TICKS).increment(1);
}

pub fn inc_convergence_timeouts() {
    metrics::counter!(CONVERGENCE_TIMEOUTS).increment(1);
}

pub fn inc_relocations(outcome: &'static str) {
    metrics::counter!(RELOCATIONS, "outcome" => outcome).increment(1);
}

pub fn inc_inventory_refreshes() {
    metrics::counter!(INVENTORY_REFRESHES).increment(1);
}
