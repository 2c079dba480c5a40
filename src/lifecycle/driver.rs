// Package lifecycle runs cluster-wide stop, start and restart.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::OrchestrationError;
use crate::manager::SERVICES_PATH;
use crate::model::{DesiredState, LifecycleTimeouts, ObservedState, ResourceIdentity, RestartTimings};
use crate::poller::{send_with_retry, StatePoller};

pub const STOP_ALL_CONTEXT: &str = "Stop All Services";
pub const START_ALL_CONTEXT: &str = "Start All Services";

/// Drives every service of the cluster through a single bulk request.
#[derive(Clone)]
pub struct BulkLifecycleDriver {
    poller: StatePoller,
}

impl BulkLifecycleDriver {
    pub fn new(poller: StatePoller) -> Self {
        Self { poller }
    }

    /// Asks the manager to stop every service. Does not wait for convergence.
    pub async fn stop_all(
        &self,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        self.bulk(DesiredState::Installed, STOP_ALL_CONTEXT, timeouts, cancel)
            .await
    }

    /// Asks the manager to start every service. Does not wait for convergence.
    pub async fn start_all(
        &self,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        self.bulk(DesiredState::Started, START_ALL_CONTEXT, timeouts, cancel)
            .await
    }

    /// Stops all services, waits until each one reports INSTALLED, lets the
    /// cluster settle, then requests a start of all services.
    ///
    /// If any service fails to reach INSTALLED within `per_service_timeout`,
    /// the start request is never sent. A transport failure or an unknown
    /// state while polling is returned as is. Final STARTED convergence is
    /// not awaited.
    pub async fn restart_all(
        &self,
        timings: &RestartTimings,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        let request_timeouts = timings.request_timeouts();
        let mut services: Vec<String> = self
            .poller
            .inventory()
            .known_services()
            .into_iter()
            .collect();
        services.sort();
        if services.is_empty() {
            warn!(
                component = "lifecycle",
                event = "empty_inventory",
                "no services known, refresh the inventory before restarting"
            );
        }

        self.stop_all(&request_timeouts, cancel).await?;

        let waits = services.iter().map(|name| {
            let identity = ResourceIdentity::service(name.as_str());
            async move {
                let result = self
                    .poller
                    .await_state(
                        &identity,
                        DesiredState::Installed,
                        timings.poll_interval,
                        timings.per_service_timeout,
                        cancel,
                    )
                    .await;
                (name, result)
            }
        });
        let results = join_all(waits).await;

        let mut offenders: Vec<(String, Option<ObservedState>)> = Vec::new();
        for (name, result) in results {
            match result {
                Ok(_) => {}
                Err(OrchestrationError::Cancelled) => return Err(OrchestrationError::Cancelled),
                Err(e @ OrchestrationError::Transport(_))
                | Err(e @ OrchestrationError::UnrecognizedState { .. }) => {
                    error!(
                        component = "lifecycle",
                        event = "restart_aborted",
                        service = %name,
                        error = %e,
                        "restart aborted before start-all"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        component = "lifecycle",
                        event = "service_not_stopped",
                        service = %name,
                        error = %e,
                        "service did not reach INSTALLED"
                    );
                    offenders.push((name.clone(), e.last_observed()));
                }
            }
        }
        if !offenders.is_empty() {
            error!(
                component = "lifecycle",
                event = "restart_aborted",
                offenders = offenders.len(),
                "restart aborted before start-all"
            );
            return Err(OrchestrationError::ServicesNotConverged {
                services: offenders,
            });
        }

        info!(
            component = "lifecycle",
            event = "all_stopped",
            services = services.len(),
            settle = ?timings.settle_delay,
            "all services stopped, settling before start"
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
            _ = tokio::time::sleep(timings.settle_delay) => {}
        }

        self.start_all(&request_timeouts, cancel).await
    }

    async fn bulk(
        &self,
        desired: DesiredState,
        context: &str,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        crate::metrics::inc_transition_requests("bulk");
        let api = self.poller.api();
        let resp = send_with_retry(SERVICES_PATH, timeouts, cancel, move || {
            api.request_bulk(desired, context)
        })
        .await?;

        info!(
            component = "lifecycle",
            event = "bulk_accepted",
            desired = %desired,
            status = resp.status,
            "{}", context
        );
        Ok(())
    }
}
