// Package poller drives a single resource to a desired state and waits for it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::retry::send_with_retry;
use crate::error::OrchestrationError;
use crate::inventory::InventoryCache;
use crate::manager::ManagerApi;
use crate::model::{
    DesiredState, LifecycleTimeouts, ObservedState, ResourceIdentity, ResourceKind,
    TransitionRequest,
};

/// Issues desired-state changes and polls observed state until convergence.
#[derive(Clone)]
pub struct StatePoller {
    api: ManagerApi,
    inventory: Arc<InventoryCache>,
}

impl StatePoller {
    pub fn new(api: ManagerApi, inventory: Arc<InventoryCache>) -> Self {
        Self { api, inventory }
    }

    pub fn api(&self) -> &ManagerApi {
        &self.api
    }

    pub fn inventory(&self) -> &Arc<InventoryCache> {
        &self.inventory
    }

    /// Requests `desired` for `identity` and waits until the manager reports it.
    pub async fn transition(
        &self,
        identity: &ResourceIdentity,
        desired: DesiredState,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<ObservedState, OrchestrationError> {
        let req = TransitionRequest::new(identity.clone(), desired);
        self.transition_request(&req, timeouts, cancel).await
    }

    /// Same as [`StatePoller::transition`] with a caller-provided context note.
    pub async fn transition_request(
        &self,
        req: &TransitionRequest,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<ObservedState, OrchestrationError> {
        self.inventory.snapshot().validate(&req.identity)?;

        let target = req.identity.to_string();
        let kind = match req.identity.kind() {
            ResourceKind::Service => "service",
            ResourceKind::Component => "component",
        };
        crate::metrics::inc_transition_requests(kind);

        let api = &self.api;
        let resp = send_with_retry(&target, timeouts, cancel, move || {
            api.request_transition(req)
        })
        .await?;

        info!(
            component = "poller",
            event = "transition_accepted",
            target = %target,
            desired = %req.desired,
            status = resp.status,
            request_id = ?request_id(&resp.body),
            "{}", req.context
        );

        self.await_state(
            &req.identity,
            req.desired,
            timeouts.poll_interval,
            timeouts.convergence_timeout,
            cancel,
        )
        .await
    }

    /// Single observation read.
    pub async fn observe(
        &self,
        identity: &ResourceIdentity,
    ) -> Result<ObservedState, OrchestrationError> {
        self.api.observe(identity).await
    }

    /// Polls `identity` until it reports `desired`, without issuing a request.
    ///
    /// Intermediate states are tolerated; only equality ends the loop
    /// successfully. Fails with `ConvergenceTimeout` once `timeout` of wall
    /// time has passed, and with `Cancelled` when `cancel` fires between reads.
    pub async fn await_state(
        &self,
        identity: &ResourceIdentity,
        desired: DesiredState,
        poll_interval: Duration,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ObservedState, OrchestrationError> {
        let start = Instant::now();
        let deadline = start + timeout;
        let mut last: Option<ObservedState> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(OrchestrationError::Cancelled);
            }

            let observed = self.api.observe(identity).await?;
            crate::metrics::inc_poll_ticks();

            if observed.satisfies(desired) {
                info!(
                    component = "poller",
                    event = "converged",
                    target = %identity,
                    state = %observed,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "{} reached {}", identity, desired
                );
                return Ok(observed);
            }

            if last != Some(observed) {
                if desired.tolerates(observed) {
                    debug!(
                        component = "poller",
                        event = "intermediate_state",
                        target = %identity,
                        state = %observed,
                        desired = %desired,
                        "waiting for convergence"
                    );
                } else {
                    warn!(
                        component = "poller",
                        event = "unexpected_state",
                        target = %identity,
                        state = %observed,
                        desired = %desired,
                        "unexpected intermediate state, still waiting"
                    );
                }
            }
            last = Some(observed);

            let now = Instant::now();
            if now >= deadline {
                crate::metrics::inc_convergence_timeouts();
                warn!(
                    component = "poller",
                    event = "convergence_timeout",
                    target = %identity,
                    last_state = %observed,
                    desired = %desired,
                    timeout = ?timeout,
                    "state did not converge in time"
                );
                return Err(OrchestrationError::ConvergenceTimeout {
                    resource: identity.clone(),
                    desired,
                    last_observed: last,
                    elapsed: now - start,
                });
            }

            let pause = poll_interval.min(deadline - now);
            debug!(
                component = "poller",
                event = "poll_tick",
                target = %identity,
                remaining_ms = (deadline - now).as_millis() as u64,
                "state not converged yet"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }
}

/// Id of the asynchronous request the manager created, if it returned one.
fn request_id(body: &serde_json::Value) -> Option<u64> {
    body.pointer("/Requests/id").and_then(serde_json::Value::as_u64)
}
