// Package relocation moves a component placement from one host to another.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::plan::{RelocationOutcome, RelocationPlan, RelocationStep};
use crate::error::OrchestrationError;
use crate::gateway::{GatewayError, Response};
use crate::model::{DesiredState, LifecycleTimeouts, ResourceIdentity};
use crate::poller::StatePoller;

/// Runs the stop, install, set-installed, delete, start sequence.
///
/// There is no rollback: a failure leaves the cluster where the failed step
/// left it and the outcome says which step that was.
#[derive(Clone)]
pub struct RelocationExecutor {
    poller: StatePoller,
}

impl RelocationExecutor {
    pub fn new(poller: StatePoller) -> Self {
        Self { poller }
    }

    /// Relocates `plan.component` from `plan.source` to `plan.destination`.
    ///
    /// Unknown names, a malformed plan or a component missing from the
    /// source host are returned as `Err` before anything is changed.
    pub async fn relocate(
        &self,
        plan: &RelocationPlan,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<RelocationOutcome, OrchestrationError> {
        let source = plan.source_identity();
        let destination = plan.destination_identity();

        let snapshot = self.poller.inventory().snapshot();
        snapshot.validate(&source)?;
        snapshot.validate(&destination)?;
        if plan.source == plan.destination {
            return Err(OrchestrationError::InvalidPlan(format!(
                "source and destination are both {}",
                plan.source
            )));
        }

        let placed = self.poller.api().host_components(&plan.source).await?;
        if !placed.iter().any(|c| c == &plan.component) {
            return Err(OrchestrationError::ComponentNotOnHost {
                component: plan.component.clone(),
                host: plan.source.clone(),
            });
        }

        info!(
            component = "relocation",
            event = "started",
            plan = %plan,
            "relocating component"
        );

        let outcome = self.run(plan, &source, &destination, timeouts, cancel).await;
        crate::metrics::inc_relocations(outcome.label());
        match &outcome {
            RelocationOutcome::Success => info!(
                component = "relocation",
                event = "finished",
                plan = %plan,
                "component relocated"
            ),
            RelocationOutcome::PartialSuccess { .. } | RelocationOutcome::Cancelled { .. } => {
                warn!(
                    component = "relocation",
                    event = "finished",
                    plan = %plan,
                    outcome = %outcome,
                    "relocation incomplete"
                )
            }
            RelocationOutcome::Failure { .. } => error!(
                component = "relocation",
                event = "finished",
                plan = %plan,
                outcome = %outcome,
                "relocation failed"
            ),
        }
        Ok(outcome)
    }

    async fn run(
        &self,
        plan: &RelocationPlan,
        source: &ResourceIdentity,
        destination: &ResourceIdentity,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> RelocationOutcome {
        let mut last = RelocationStep::CheckPlacement;

        // Stop the source placement
        if cancel.is_cancelled() {
            return cancelled(last, None);
        }
        if let Err(e) = self
            .poller
            .transition(source, DesiredState::Installed, timeouts, cancel)
            .await
        {
            return abort(plan, RelocationStep::Stop, last, e, None);
        }
        last = step_done(plan, RelocationStep::Stop);

        // Create the destination placement
        if cancel.is_cancelled() {
            return cancelled(last, None);
        }
        let created = self
            .poller
            .api()
            .create_placement(&plan.component, &plan.destination)
            .await;
        if let Err(e) = accepted(destination, created) {
            return abort(plan, RelocationStep::Install, last, e, None);
        }
        last = step_done(plan, RelocationStep::Install);

        // Install it
        if cancel.is_cancelled() {
            return cancelled(last, None);
        }
        if let Err(e) = self
            .poller
            .transition(destination, DesiredState::Installed, timeouts, cancel)
            .await
        {
            return abort(plan, RelocationStep::SetInstalled, last, e, None);
        }
        last = step_done(plan, RelocationStep::SetInstalled);

        // Remove the source placement; a failure here is reported, not fatal
        if cancel.is_cancelled() {
            return cancelled(last, None);
        }
        let deleted = self
            .poller
            .api()
            .delete_placement(&plan.component, &plan.source)
            .await;
        let cleanup = match accepted(source, deleted) {
            Ok(()) => {
                last = step_done(plan, RelocationStep::Delete);
                None
            }
            Err(e) => {
                warn!(
                    component = "relocation",
                    event = "delete_failed",
                    plan = %plan,
                    error = %e,
                    "old placement left in place, continuing"
                );
                Some(failed(plan, RelocationStep::Delete, e))
            }
        };

        // Start the destination placement
        if cancel.is_cancelled() {
            return cancelled(last, cleanup);
        }
        if let Err(e) = self
            .poller
            .transition(destination, DesiredState::Started, timeouts, cancel)
            .await
        {
            return abort(plan, RelocationStep::Start, last, e, cleanup);
        }
        step_done(plan, RelocationStep::Start);

        match cleanup {
            Some(cause) => RelocationOutcome::PartialSuccess {
                failed_step: RelocationStep::Delete,
                cause,
            },
            None => RelocationOutcome::Success,
        }
    }
}

fn step_done(plan: &RelocationPlan, step: RelocationStep) -> RelocationStep {
    info!(
        component = "relocation",
        event = "step_completed",
        plan = %plan,
        step = %step,
        "relocation step completed"
    );
    step
}

/// Single-shot placement mutations: anything but 2xx is a rejection.
fn accepted(
    target: &ResourceIdentity,
    result: Result<Response, GatewayError>,
) -> Result<(), OrchestrationError> {
    let resp = result?;
    if resp.is_success() {
        return Ok(());
    }
    Err(OrchestrationError::RequestRejected {
        target: target.to_string(),
        status: resp.status,
        attempts: 1,
        body: resp.body,
    })
}

fn cancelled(last_completed: RelocationStep, cleanup: Option<OrchestrationError>) -> RelocationOutcome {
    RelocationOutcome::Cancelled {
        last_completed,
        cleanup,
    }
}

fn abort(
    plan: &RelocationPlan,
    step: RelocationStep,
    last_completed: RelocationStep,
    cause: OrchestrationError,
    cleanup: Option<OrchestrationError>,
) -> RelocationOutcome {
    if cause.is_cancelled() {
        return cancelled(last_completed, cleanup);
    }
    RelocationOutcome::Failure {
        failed_step: step,
        last_completed,
        cause: failed(plan, step, cause),
        cleanup,
    }
}

/// Wraps `cause` in the error naming the failed step and the host it ran on.
fn failed(plan: &RelocationPlan, step: RelocationStep, cause: OrchestrationError) -> OrchestrationError {
    let component = plan.component.clone();
    let source = Box::new(cause);
    match step {
        RelocationStep::Stop => OrchestrationError::StopFailed {
            component,
            host: plan.source.clone(),
            source,
        },
        RelocationStep::Delete => OrchestrationError::DeleteFailed {
            component,
            host: plan.source.clone(),
            source,
        },
        RelocationStep::Start => OrchestrationError::StartFailed {
            component,
            host: plan.destination.clone(),
            source,
        },
        RelocationStep::Install
        | RelocationStep::SetInstalled
        | RelocationStep::Validate
        | RelocationStep::CheckPlacement => OrchestrationError::InstallFailed {
            component,
            host: plan.destination.clone(),
            source,
        },
    }
}
