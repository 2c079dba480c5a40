// Caller-facing orchestration operations on one cluster.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::audit::{AuditSink, FileAuditLog, NoopAudit};
use crate::config::{Config, ConfigTrait};
use crate::error::OrchestrationError;
use crate::gateway::{Gateway, ManagerGateway};
use crate::inventory::{Inventory, InventoryCache};
use crate::lifecycle::BulkLifecycleDriver;
use crate::manager::ManagerApi;
use crate::model::{
    DesiredState, LifecycleTimeouts, ObservedState, ResourceIdentity, ResourceKind,
    RestartTimings,
};
use crate::poller::StatePoller;
use crate::relocation::{RelocationExecutor, RelocationOutcome, RelocationPlan};

/// Encapsulates the orchestrator state for one cluster.
#[derive(Clone)]
pub struct App {
    cfg: Config,
    api: ManagerApi,
    inventory: Arc<InventoryCache>,
    poller: StatePoller,
    bulk: BulkLifecycleDriver,
    relocation: RelocationExecutor,
}

impl App {
    /// Builds the application from configuration, talking HTTP to the manager.
    pub fn new(cfg: Config) -> Result<Self> {
        let gateway = Arc::new(ManagerGateway::new(cfg.manager())?);
        info!(
            component = "app",
            event = "gateway_ready",
            endpoint = gateway.base_url(),
            "manager gateway configured"
        );

        let audit: Arc<dyn AuditSink> = match cfg.audit() {
            Some(audit) if audit.enabled => match audit.path.as_deref() {
                Some(path) => Arc::new(FileAuditLog::new(path)),
                None => anyhow::bail!("audit.path must be configured when audit is enabled"),
            },
            _ => Arc::new(NoopAudit),
        };

        Ok(Self::with_gateway(cfg, gateway, audit))
    }

    /// Builds the application on top of an existing gateway.
    pub fn with_gateway(cfg: Config, gateway: Arc<dyn Gateway>, audit: Arc<dyn AuditSink>) -> Self {
        let api = ManagerApi::new(gateway, audit);
        let inventory = Arc::new(InventoryCache::empty());
        let poller = StatePoller::new(api.clone(), inventory.clone());
        Self {
            cfg,
            bulk: BulkLifecycleDriver::new(poller.clone()),
            relocation: RelocationExecutor::new(poller.clone()),
            api,
            inventory,
            poller,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Transition timeouts from configuration.
    pub fn timeouts(&self) -> LifecycleTimeouts {
        self.cfg.lifecycle().timeouts()
    }

    /// Restart timings from configuration.
    pub fn restart_timings(&self) -> RestartTimings {
        self.cfg.lifecycle().restart_timings()
    }

    pub fn inventory(&self) -> &Arc<InventoryCache> {
        &self.inventory
    }

    /// Reloads service and component names from the manager.
    pub async fn refresh_inventory(&self) -> Result<Arc<Inventory>, OrchestrationError> {
        self.inventory.refresh(&self.api).await
    }

    pub async fn transition_service(
        &self,
        name: &str,
        desired: DesiredState,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<ObservedState, OrchestrationError> {
        self.poller
            .transition(&ResourceIdentity::service(name), desired, timeouts, cancel)
            .await
    }

    pub async fn transition_component(
        &self,
        name: &str,
        host: &str,
        desired: DesiredState,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<ObservedState, OrchestrationError> {
        self.poller
            .transition(
                &ResourceIdentity::component(name, host),
                desired,
                timeouts,
                cancel,
            )
            .await
    }

    pub async fn stop_all_services(
        &self,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        self.bulk.stop_all(timeouts, cancel).await
    }

    pub async fn start_all_services(
        &self,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        self.bulk.start_all(timeouts, cancel).await
    }

    pub async fn restart_all_services(
        &self,
        timings: &RestartTimings,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationError> {
        self.bulk.restart_all(timings, cancel).await
    }

    pub async fn relocate_component(
        &self,
        plan: &RelocationPlan,
        timeouts: &LifecycleTimeouts,
        cancel: &CancellationToken,
    ) -> Result<RelocationOutcome, OrchestrationError> {
        self.relocation.relocate(plan, timeouts, cancel).await
    }

    /// Current state of a known service.
    pub async fn service_state(&self, name: &str) -> Result<ObservedState, OrchestrationError> {
        let identity = ResourceIdentity::service(name);
        self.inventory.snapshot().validate(&identity)?;
        self.poller.observe(&identity).await
    }

    /// Current state of every known service, sorted by name.
    pub async fn services_states(&self) -> Result<Vec<(String, ObservedState)>, OrchestrationError> {
        let mut names: Vec<String> = self.inventory.known_services().into_iter().collect();
        names.sort();

        let mut states = Vec::with_capacity(names.len());
        for name in names {
            let state = self.poller.observe(&ResourceIdentity::service(name.as_str())).await?;
            states.push((name, state));
        }
        Ok(states)
    }

    /// Cluster-wide state of a known component.
    pub async fn component_state(&self, name: &str) -> Result<ObservedState, OrchestrationError> {
        self.known_component(name)?;
        self.api.component_state(name).await
    }

    /// State of a component on one host.
    pub async fn placement_state(
        &self,
        name: &str,
        host: &str,
    ) -> Result<ObservedState, OrchestrationError> {
        let identity = ResourceIdentity::component(name, host);
        self.inventory.snapshot().validate(&identity)?;
        self.poller.observe(&identity).await
    }

    /// Cluster-wide state of every component of `service`, sorted by name.
    pub async fn components_states(
        &self,
        service: &str,
    ) -> Result<Vec<(String, ObservedState)>, OrchestrationError> {
        let snapshot = self.inventory.snapshot();
        snapshot.validate(&ResourceIdentity::service(service))?;

        let mut states = Vec::new();
        for component in snapshot.components_of(service) {
            let state = self.api.component_state(&component).await?;
            states.push((component, state));
        }
        Ok(states)
    }

    /// Whether `name` is placed on `host`.
    pub async fn component_on_host(&self, name: &str, host: &str) -> Result<bool, OrchestrationError> {
        self.known_component(name)?;
        let placed = self.api.host_components(host).await?;
        Ok(placed.iter().any(|c| c == name))
    }

    /// True when `name` is a known service rather than a component.
    /// Hosts whose DataNode is live according to the NameNode.
    pub async fn live_nodes(&self) -> Result<Vec<String>, OrchestrationError> {
        self.api.live_nodes().await
    }

    pub fn is_service(&self, name: &str) -> bool {
        self.inventory.snapshot().has_service(name)
    }

    fn known_component(&self, name: &str) -> Result<(), OrchestrationError> {
        if self.inventory.snapshot().has_component(name) {
            return Ok(());
        }
        Err(OrchestrationError::UnknownResource {
            kind: ResourceKind::Component,
            name: name.to_string(),
        })
    }
}
