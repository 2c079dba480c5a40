// Timing parameters passed explicitly into every orchestration entry point.

use std::time::Duration;

/// Polling and retry parameters for a single transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleTimeouts {
    /// Pause between two observation reads.
    pub poll_interval: Duration,
    /// Wall-clock bound on waiting for convergence once the request is accepted.
    pub convergence_timeout: Duration,
    /// Additional attempts allowed when the manager rejects the request.
    pub request_retry_budget: u32,
    /// Fixed pause before re-issuing a rejected request.
    pub retry_delay: Duration,
}

impl LifecycleTimeouts {
    pub fn new(poll_interval: Duration, convergence_timeout: Duration) -> Self {
        Self {
            poll_interval,
            convergence_timeout,
            request_retry_budget: 0,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn with_retries(mut self, budget: u32, delay: Duration) -> Self {
        self.request_retry_budget = budget;
        self.retry_delay = delay;
        self
    }
}

/// Parameters of the stop-all / wait / start-all saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartTimings {
    pub poll_interval: Duration,
    /// Bound on each service reaching INSTALLED after the bulk stop.
    pub per_service_timeout: Duration,
    /// Grace period between confirmed stop and the bulk start request.
    pub settle_delay: Duration,
    pub request_retry_budget: u32,
    pub retry_delay: Duration,
}

impl RestartTimings {
    /// Timeouts applied to the bulk stop and start requests themselves.
    pub fn request_timeouts(&self) -> LifecycleTimeouts {
        LifecycleTimeouts {
            poll_interval: self.poll_interval,
            convergence_timeout: self.per_service_timeout,
            request_retry_budget: self.request_retry_budget,
            retry_delay: self.retry_delay,
        }
    }
}
