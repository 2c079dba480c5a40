// Relocation plan, workflow steps and the reported outcome.

use std::fmt;

use crate::error::OrchestrationError;
use crate::model::ResourceIdentity;

/// Move `component` from `source` to `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    pub component: String,
    pub source: String,
    pub destination: String,
}

impl RelocationPlan {
    pub fn new(
        component: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// The component's current placement.
    pub fn source_identity(&self) -> ResourceIdentity {
        ResourceIdentity::component(self.component.as_str(), self.source.as_str())
    }

    /// The placement being created.
    pub fn destination_identity(&self) -> ResourceIdentity {
        ResourceIdentity::component(self.component.as_str(), self.destination.as_str())
    }
}

impl fmt::Display for RelocationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} to {}",
            self.component, self.source, self.destination
        )
    }
}

/// Steps of a relocation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelocationStep {
    Validate,
    CheckPlacement,
    Stop,
    Install,
    SetInstalled,
    Delete,
    Start,
}

impl RelocationStep {
    pub fn as_str(self) -> &'static str {
        match self {
            RelocationStep::Validate => "validate",
            RelocationStep::CheckPlacement => "check_placement",
            RelocationStep::Stop => "stop",
            RelocationStep::Install => "install",
            RelocationStep::SetInstalled => "set_installed",
            RelocationStep::Delete => "delete",
            RelocationStep::Start => "start",
        }
    }
}

impl fmt::Display for RelocationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a relocation that passed its preconditions ended.
///
/// `cleanup` carries the `DeleteFailed` error when the source placement could
/// not be removed before a later step failed or was cancelled.
#[derive(Debug)]
pub enum RelocationOutcome {
    /// The component runs on the destination and is gone from the source.
    Success,
    /// The component runs on the destination; only the source cleanup failed.
    PartialSuccess {
        failed_step: RelocationStep,
        cause: OrchestrationError,
    },
    /// A mutating step failed; later steps were not attempted.
    Failure {
        failed_step: RelocationStep,
        last_completed: RelocationStep,
        cause: OrchestrationError,
        cleanup: Option<OrchestrationError>,
    },
    /// The cancel signal fired before or during a step.
    Cancelled {
        last_completed: RelocationStep,
        cleanup: Option<OrchestrationError>,
    },
}

impl RelocationOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RelocationOutcome::Success => "success",
            RelocationOutcome::PartialSuccess { .. } => "partial_success",
            RelocationOutcome::Failure { .. } => "failure",
            RelocationOutcome::Cancelled { .. } => "cancelled",
        }
    }

    /// True when the component ended up running on the destination.
    pub fn is_relocated(&self) -> bool {
        matches!(
            self,
            RelocationOutcome::Success | RelocationOutcome::PartialSuccess { .. }
        )
    }

    /// The failed removal of the source placement, if one still needs doing by hand.
    pub fn pending_cleanup(&self) -> Option<&OrchestrationError> {
        match self {
            RelocationOutcome::Success => None,
            RelocationOutcome::PartialSuccess { cause, .. } => Some(cause),
            RelocationOutcome::Failure { cleanup, .. }
            | RelocationOutcome::Cancelled { cleanup, .. } => cleanup.as_ref(),
        }
    }
}

impl fmt::Display for RelocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocationOutcome::Success => f.write_str("relocated"),
            RelocationOutcome::PartialSuccess { failed_step, cause } => {
                write!(f, "relocated, but step {} failed: {}", failed_step, cause)
            }
            RelocationOutcome::Failure {
                failed_step,
                last_completed,
                cause,
                cleanup,
            } => {
                write!(
                    f,
                    "step {} failed after {}: {}",
                    failed_step, last_completed, cause
                )?;
                write_cleanup(f, cleanup)
            }
            RelocationOutcome::Cancelled {
                last_completed,
                cleanup,
            } => {
                write!(f, "cancelled after step {}", last_completed)?;
                write_cleanup(f, cleanup)
            }
        }
    }
}

fn write_cleanup(f: &mut fmt::Formatter<'_>, cleanup: &Option<OrchestrationError>) -> fmt::Result {
    match cleanup {
        Some(cause) => write!(f, "; cleanup pending: {}", cause),
        None => Ok(()),
    }
}
