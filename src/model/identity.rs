// Typed references to manager-side objects and the requests made against them.

use std::fmt;

use super::state::DesiredState;

/// A manager-side object the orchestrator can act on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceIdentity {
    /// A cluster service, e.g. `HDFS`.
    Service(String),
    /// A component placed on a specific host, e.g. `WEBHCAT_SERVER@node2`.
    Component { name: String, host: String },
}

impl ResourceIdentity {
    pub fn service(name: impl Into<String>) -> Self {
        ResourceIdentity::Service(name.into())
    }

    pub fn component(name: impl Into<String>, host: impl Into<String>) -> Self {
        ResourceIdentity::Component {
            name: name.into(),
            host: host.into(),
        }
    }

    /// Service or component name, without the host.
    pub fn name(&self) -> &str {
        match self {
            ResourceIdentity::Service(name) => name,
            ResourceIdentity::Component { name, .. } => name,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceIdentity::Service(_) => ResourceKind::Service,
            ResourceIdentity::Component { .. } => ResourceKind::Component,
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceIdentity::Service(name) => write!(f, "service {}", name),
            ResourceIdentity::Component { name, host } => {
                write!(f, "component {}@{}", name, host)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Service,
    Component,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Service => f.write_str("service"),
            ResourceKind::Component => f.write_str("component"),
        }
    }
}

/// A single desired-state change, consumed once by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub identity: ResourceIdentity,
    pub desired: DesiredState,
    /// Human-readable context note; also written to the audit log.
    pub context: String,
}

impl TransitionRequest {
    /// Builds a request with the default "Stopping X" / "Starting X" note.
    pub fn new(identity: ResourceIdentity, desired: DesiredState) -> Self {
        let context = match &identity {
            ResourceIdentity::Service(name) => format!("{} {}", desired.verb(), name),
            ResourceIdentity::Component { name, host } => {
                format!("Change {} state to {} on {}", name, desired, host)
            }
        };
        Self {
            identity,
            desired,
            context,
        }
    }
}
