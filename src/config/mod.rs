// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::model::{LifecycleTimeouts, RestartTimings};

pub const PROD: &str = "prod";
pub const TEST: &str = "test";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_CONVERGENCE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REQUEST_RETRY_BUDGET: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_PER_SERVICE_TIMEOUT: Duration = Duration::from_secs(15 * 60);
// Dependent services in the target cluster need about two minutes to drain.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Ctl {
    #[serde(rename = "ambarictl")]
    pub ctl: CtlBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CtlBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub manager: Option<Manager>,
    pub lifecycle: Option<Lifecycle>,
    pub audit: Option<Audit>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

/// Connection settings of the cluster manager's control API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Manager {
    pub scheme: Option<String>,
    /// `host:port` of the manager, e.g. `namenode:8080`.
    pub host: Option<String>,
    pub cluster: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Name of an environment variable holding the password.
    #[serde(rename = "password_env")]
    pub password_env: Option<String>,
    /// Value of the `X-Requested-By` header the manager demands.
    #[serde(rename = "requested_by")]
    pub requested_by: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Maximum requests per second issued to the manager.
    pub rate: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Lifecycle {
    #[serde(rename = "poll_interval", default, with = "humantime_serde")]
    pub poll_interval: Option<Duration>,
    #[serde(rename = "convergence_timeout", default, with = "humantime_serde")]
    pub convergence_timeout: Option<Duration>,
    #[serde(rename = "request_retry_budget")]
    pub request_retry_budget: Option<u32>,
    #[serde(rename = "retry_delay", default, with = "humantime_serde")]
    pub retry_delay: Option<Duration>,
    #[serde(rename = "per_service_timeout", default, with = "humantime_serde")]
    pub per_service_timeout: Option<Duration>,
    #[serde(rename = "settle_delay", default, with = "humantime_serde")]
    pub settle_delay: Option<Duration>,
}

impl Lifecycle {
    /// Single-transition timeouts, falling back to defaults for unset fields.
    pub fn timeouts(&self) -> LifecycleTimeouts {
        LifecycleTimeouts {
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            convergence_timeout: self
                .convergence_timeout
                .unwrap_or(DEFAULT_CONVERGENCE_TIMEOUT),
            request_retry_budget: self
                .request_retry_budget
                .unwrap_or(DEFAULT_REQUEST_RETRY_BUDGET),
            retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
        }
    }

    pub fn restart_timings(&self) -> RestartTimings {
        let base = self.timeouts();
        RestartTimings {
            poll_interval: base.poll_interval,
            per_service_timeout: self
                .per_service_timeout
                .unwrap_or(DEFAULT_PER_SERVICE_TIMEOUT),
            settle_delay: self.settle_delay.unwrap_or(DEFAULT_SETTLE_DELAY),
            request_retry_budget: base.request_retry_budget,
            retry_delay: base.retry_delay,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Audit {
    pub enabled: bool,
    pub path: Option<String>,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    fn manager(&self) -> Option<&Manager>;
    fn lifecycle(&self) -> Lifecycle;
    fn audit(&self) -> Option<&Audit>;
}

// Config type alias for convenience
pub type Config = Ctl;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.ctl.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.ctl.env == PROD
    }

    fn manager(&self) -> Option<&Manager> {
        self.ctl.manager.as_ref()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.ctl.lifecycle.clone().unwrap_or_default()
    }

    fn audit(&self) -> Option<&Audit> {
        self.ctl.audit.as_ref()
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        // Read file
        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::parse(&data).with_context(|| format!("load config from {:?}", abs_path))
    }

    /// Parses and validates configuration from a YAML document.
    pub fn parse(data: &str) -> Result<Self> {
        let mut cfg: Ctl = serde_yaml::from_str(data).context("unmarshal yaml")?;

        let manager = match cfg.ctl.manager.as_mut() {
            Some(manager) => manager,
            None => anyhow::bail!("no manager configured"),
        };
        if manager.host.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("manager.host must be configured");
        }
        if manager.cluster.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!("manager.cluster must be configured");
        }

        // Resolve password from the environment when requested
        if let Some(var) = manager.password_env.as_deref() {
            let password = std::env::var(var)
                .with_context(|| format!("manager.password_env {} is not set", var))?;
            manager.password = Some(password);
        }

        if let Some(audit) = cfg.ctl.audit.as_ref() {
            if audit.enabled && audit.path.is_none() {
                anyhow::bail!("audit.path must be configured when audit is enabled");
            }
        }

        Ok(cfg)
    }
}

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;
