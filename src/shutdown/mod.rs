// Package shutdown turns an OS interrupt into cooperative cancellation.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("operation did not stop within the grace period after interrupt")]
pub struct TimeoutError;

/// Cancels the shared token on Ctrl-C so running workflows stop at their
/// next step boundary or poll iteration.
#[derive(Clone)]
pub struct Interrupt {
    token: CancellationToken,
    grace: Duration,
}

impl Interrupt {
    pub fn new(token: CancellationToken, grace: Duration) -> Self {
        Self { token, grace }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Drives `work` to completion. On Ctrl-C the token is cancelled and
    /// `work` gets the grace period to report how far it got.
    pub async fn run<F, T>(&self, work: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        tokio::pin!(work);

        tokio::select! {
            out = &mut work => return Ok(out),
            _ = signal::ctrl_c() => {
                info!(
                    component = "shutdown",
                    event = "os_signal",
                    signal = "SIGINT",
                    "cancellation started"
                );
                self.token.cancel();
            }
            _ = self.token.cancelled() => {
                info!(
                    component = "shutdown",
                    event = "ctx_done",
                    "cancellation started"
                );
            }
        }

        match timeout(self.grace, work).await {
            Ok(out) => Ok(out),
            Err(_) => {
                warn!(
                    component = "shutdown",
                    event = "grace_timeout",
                    grace_secs = self.grace.as_secs(),
                    "operation ignored cancellation"
                );
                Err(TimeoutError.into())
            }
        }
    }
}
