use super::{Config, CtlBox};
use std::time::Duration;

/// Creates a new test configuration pointing at `host`.
pub fn new_test_config(host: &str) -> Config {
    Config {
        ctl: CtlBox {
            env: super::TEST.to_string(),
            logs: Some(super::Logs {
                level: Some("debug".to_string()),
            }),
            manager: Some(super::Manager {
                scheme: Some("http".to_string()),
                host: Some(host.to_string()),
                cluster: Some("testcl".to_string()),
                username: Some("admin".to_string()),
                password: Some("admin".to_string()),
                password_env: None,
                requested_by: Some("ambari".to_string()),
                timeout: Some(Duration::from_secs(5)),
                rate: Some(1000),
            }),
            lifecycle: Some(super::Lifecycle {
                poll_interval: Some(Duration::from_millis(10)),
                convergence_timeout: Some(Duration::from_secs(2)),
                request_retry_budget: Some(2),
                retry_delay: Some(Duration::from_millis(5)),
                per_service_timeout: Some(Duration::from_secs(2)),
                settle_delay: Some(Duration::from_millis(10)),
            }),
            audit: None,
        },
    }
}
