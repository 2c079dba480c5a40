// Error taxonomy shared by the poller, the bulk driver and the relocation workflow.

use std::time::Duration;

use serde_json::Value;

use crate::gateway::GatewayError;
use crate::model::{DesiredState, ObservedState, ResourceIdentity, ResourceKind, UnrecognizedState};

#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("{kind} {name} is not in the inventory; refresh it or check the spelling")]
    UnknownResource { kind: ResourceKind, name: String },

    #[error("invalid {resource}: {reason}")]
    InvalidResource {
        resource: ResourceIdentity,
        reason: &'static str,
    },

    #[error("invalid relocation plan: {0}")]
    InvalidPlan(String),

    #[error("{target}: request rejected with status {status} after {attempts} attempt(s)")]
    RequestRejected {
        target: String,
        status: u16,
        attempts: u32,
        body: Value,
    },

    #[error(
        "{resource} did not reach {desired} within {elapsed:?} (last observed: {})",
        display_state(.last_observed)
    )]
    ConvergenceTimeout {
        resource: ResourceIdentity,
        desired: DesiredState,
        last_observed: Option<ObservedState>,
        elapsed: Duration,
    },

    #[error("component {component} is not placed on host {host}")]
    ComponentNotOnHost { component: String, host: String },

    #[error("failed to stop {component} on {host}: {source}")]
    StopFailed {
        component: String,
        host: String,
        #[source]
        source: Box<OrchestrationError>,
    },

    #[error("failed to install {component} on {host}: {source}")]
    InstallFailed {
        component: String,
        host: String,
        #[source]
        source: Box<OrchestrationError>,
    },

    #[error("failed to delete {component} from {host}: {source}")]
    DeleteFailed {
        component: String,
        host: String,
        #[source]
        source: Box<OrchestrationError>,
    },

    #[error("failed to start {component} on {host}: {source}")]
    StartFailed {
        component: String,
        host: String,
        #[source]
        source: Box<OrchestrationError>,
    },

    #[error("services did not reach INSTALLED in time: {}", display_services(.services))]
    ServicesNotConverged {
        services: Vec<(String, Option<ObservedState>)>,
    },

    #[error("{resource}: {source}")]
    UnrecognizedState {
        resource: String,
        #[source]
        source: UnrecognizedState,
    },

    #[error("unexpected response from {path} (status {status}): {detail}")]
    UnexpectedResponse {
        path: String,
        status: u16,
        detail: String,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] GatewayError),
}

impl OrchestrationError {
    /// Last state the manager reported before the failure, when known.
    pub fn last_observed(&self) -> Option<ObservedState> {
        match self {
            OrchestrationError::ConvergenceTimeout { last_observed, .. } => *last_observed,
            OrchestrationError::StopFailed { source, .. }
            | OrchestrationError::InstallFailed { source, .. }
            | OrchestrationError::DeleteFailed { source, .. }
            | OrchestrationError::StartFailed { source, .. } => source.last_observed(),
            _ => None,
        }
    }

    /// True when the error, or the step failure wrapping it, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            OrchestrationError::Cancelled => true,
            OrchestrationError::StopFailed { source, .. }
            | OrchestrationError::InstallFailed { source, .. }
            | OrchestrationError::DeleteFailed { source, .. }
            | OrchestrationError::StartFailed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

fn display_state(state: &Option<ObservedState>) -> String {
    match state {
        Some(state) => state.to_string(),
        None => "nothing".to_string(),
    }
}

fn display_services(services: &[(String, Option<ObservedState>)]) -> String {
    services
        .iter()
        .map(|(name, state)| format!("{} ({})", name, display_state(state)))
        .collect::<Vec<_>>()
        .join(", ")
}
