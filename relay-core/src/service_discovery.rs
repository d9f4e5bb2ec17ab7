//! Endpoint registry: list_endpoints(service_name) -> endpoints. Refreshed by whoever owns it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::endpoint::{Endpoint, ServiceName};

/// Where the known instances of a service come from. Implementations: static config, a registry poller, etc.
pub trait EndpointRegistry: Send + Sync {
    /// Snapshot of the endpoints currently known for `service`, in registration order.
    fn list_endpoints(&self, service: &ServiceName) -> Vec<Endpoint>;
}

/// In-memory registry. Can be updated at runtime while clients read it.
#[derive(Default)]
pub struct StaticRegistry {
    services: RwLock<HashMap<ServiceName, Vec<Endpoint>>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (service, endpoints) pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ServiceName, Vec<Endpoint>)>,
    {
        let registry = Self::new();
        for (name, endpoints) in pairs {
            registry.replace(name, endpoints);
        }
        registry
    }

    /// Add an endpoint under `service`. Already-known endpoints are not duplicated.
    pub fn register(&self, service: ServiceName, endpoint: Endpoint) {
        let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
        let endpoints = services.entry(service).or_default();
        if !endpoints.contains(&endpoint) {
            endpoints.push(endpoint);
        }
    }

    /// Remove an endpoint. Returns whether it was known.
    pub fn deregister(&self, service: &ServiceName, endpoint: &Endpoint) -> bool {
        let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
        let Some(endpoints) = services.get_mut(service) else {
            return false;
        };
        let before = endpoints.len();
        endpoints.retain(|e| e != endpoint);
        before != endpoints.len()
    }

    /// Replace the whole endpoint list of `service` (e.g. after a registry refresh).
    pub fn replace(&self, service: ServiceName, endpoints: Vec<Endpoint>) {
        let mut deduped: Vec<Endpoint> = Vec::with_capacity(endpoints.len());
        for e in endpoints {
            if !deduped.contains(&e) {
                deduped.push(e);
            }
        }
        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(service, deduped);
    }
}

impl EndpointRegistry for StaticRegistry {
    fn list_endpoints(&self, service: &ServiceName) -> Vec<Endpoint> {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .cloned()
            .unwrap_or_default()
    }
}
