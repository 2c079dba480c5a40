// Bounded re-issue of state-change requests the manager rejects.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::OrchestrationError;
use crate::gateway::{GatewayError, Response};
use crate::model::LifecycleTimeouts;

/// Sends a request, re-sending it after `retry_delay` while the manager
/// answers with a non-2xx status, at most `request_retry_budget` extra times.
///
/// Transport errors are returned as-is on the first occurrence.
pub async fn send_with_retry<F, Fut>(
    target: &str,
    timeouts: &LifecycleTimeouts,
    cancel: &CancellationToken,
    send: F,
) -> Result<Response, OrchestrationError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, GatewayError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let resp = send().await?;
        if resp.is_success() {
            return Ok(resp);
        }

        if attempt > timeouts.request_retry_budget {
            warn!(
                component = "poller",
                event = "request_rejected",
                target = %target,
                status = resp.status,
                attempts = attempt,
                "manager rejected request, retry budget exhausted"
            );
            return Err(OrchestrationError::RequestRejected {
                target: target.to_string(),
                status: resp.status,
                attempts: attempt,
                body: resp.body,
            });
        }

        crate::metrics::inc_request_retries();
        warn!(
            component = "poller",
            event = "request_retry",
            target = %target,
            status = resp.status,
            attempt = attempt,
            budget = timeouts.request_retry_budget,
            detail = %crate::manager::detail(&resp.body),
            "manager rejected request, retrying"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
            _ = tokio::time::sleep(timeouts.retry_delay) => {}
        }
    }
}
