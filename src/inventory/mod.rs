//! Inventory cache: last-known service and component names.
//!
//! Readers load the current snapshot without locking; [`InventoryCache::refresh`]
//! builds a complete new snapshot and swaps it in, so a reader never sees a
//! half-updated inventory.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::error::OrchestrationError;
use crate::manager::ManagerApi;
use crate::model::{ResourceIdentity, ResourceKind};

/// Immutable view of the cluster's services and components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    services: HashSet<String>,
    components: HashSet<String>,
    owners: HashMap<String, String>,
}

impl Inventory {
    /// Builds a snapshot from service names and `(component, service)` pairs.
    pub fn new<S, C>(services: S, components: C) -> Self
    where
        S: IntoIterator<Item = String>,
        C: IntoIterator<Item = (String, String)>,
    {
        let services: HashSet<String> = services.into_iter().collect();
        let mut component_names = HashSet::new();
        let mut owners = HashMap::new();
        for (component, service) in components {
            component_names.insert(component.clone());
            if !service.is_empty() {
                owners.insert(component, service);
            }
        }
        Self {
            services,
            components: component_names,
            owners,
        }
    }

    pub fn services(&self) -> &HashSet<String> {
        &self.services
    }

    pub fn components(&self) -> &HashSet<String> {
        &self.components
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains(name)
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains(name)
    }

    /// Components owned by `service`, sorted by name.
    pub fn components_of(&self, service: &str) -> Vec<String> {
        let mut components: Vec<String> = self
            .owners
            .iter()
            .filter(|(_, owner)| owner.as_str() == service)
            .map(|(component, _)| component.clone())
            .collect();
        components.sort();
        components
    }

    /// Checks that `identity` names a known resource and is well formed.
    pub fn validate(&self, identity: &ResourceIdentity) -> Result<(), OrchestrationError> {
        match identity {
            ResourceIdentity::Service(name) => {
                if !self.has_service(name) {
                    return Err(OrchestrationError::UnknownResource {
                        kind: ResourceKind::Service,
                        name: name.clone(),
                    });
                }
            }
            ResourceIdentity::Component { name, host } => {
                if !self.has_component(name) {
                    return Err(OrchestrationError::UnknownResource {
                        kind: ResourceKind::Component,
                        name: name.clone(),
                    });
                }
                if host.trim().is_empty() {
                    return Err(OrchestrationError::InvalidResource {
                        resource: identity.clone(),
                        reason: "host must not be empty",
                    });
                }
            }
        }
        Ok(())
    }
}

/// Shared holder of the current [`Inventory`] snapshot.
pub struct InventoryCache {
    current: ArcSwap<Inventory>,
}

impl InventoryCache {
    /// Creates a cache seeded with `initial`.
    pub fn new(initial: Inventory) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Creates an empty cache; every name is unknown until the first refresh.
    pub fn empty() -> Self {
        Self::new(Inventory::default())
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Inventory> {
        self.current.load_full()
    }

    pub fn known_services(&self) -> HashSet<String> {
        self.current.load().services.clone()
    }

    pub fn known_components(&self) -> HashSet<String> {
        self.current.load().components.clone()
    }

    pub fn components_of(&self, service: &str) -> Vec<String> {
        self.current.load().components_of(service)
    }

    /// Replaces the snapshot wholesale.
    pub fn replace(&self, inventory: Inventory) -> Arc<Inventory> {
        let next = Arc::new(inventory);
        self.current.store(Arc::clone(&next));
        next
    }

    /// Fetches services and components from the manager and swaps in the
    /// resulting snapshot. On failure the previous snapshot stays in place.
    pub async fn refresh(&self, api: &ManagerApi) -> Result<Arc<Inventory>, OrchestrationError> {
        let services = api.list_services().await?;
        let components = api.list_components().await?;
        let next = self.replace(Inventory::new(services, components));

        crate::metrics::inc_inventory_refreshes();
        info!(
            component = "inventory",
            event = "refreshed",
            services = next.services.len(),
            components = next.components.len(),
            "inventory refreshed"
        );
        Ok(next)
    }
}

impl Default for InventoryCache {
    fn default() -> Self {
        Self::empty()
    }
}
