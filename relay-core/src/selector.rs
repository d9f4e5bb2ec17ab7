//! Client-side endpoint selection: registry snapshot + pluggable strategy.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::endpoint::{Endpoint, ServiceName};
use crate::service_discovery::EndpointRegistry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("no endpoints registered for service {0:?}")]
    NoEndpoints(ServiceName),
}

/// Picks one of the candidates. Only called with a non-empty slice.
pub trait SelectionStrategy: Send + Sync {
    fn choose(&self, service: &ServiceName, candidates: &[Endpoint]) -> usize;
}

/// Rotates through the candidates, one cursor per service.
#[derive(Default)]
pub struct RoundRobin {
    cursors: Mutex<HashMap<ServiceName, usize>>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn choose(&self, service: &ServiceName, candidates: &[Endpoint]) -> usize {
        let len = candidates.len();
        let mut cursors = self.cursors.lock().unwrap_or_else(PoisonError::into_inner);
        let cursor = cursors.entry(service.clone()).or_insert(0);
        // The endpoint set may have shrunk since the last call.
        let index = *cursor % len;
        *cursor = (index + 1) % len;
        index
    }
}

/// Always the first candidate.
#[derive(Default, Clone, Copy)]
pub struct FirstAvailable;

impl SelectionStrategy for FirstAvailable {
    fn choose(&self, _service: &ServiceName, _candidates: &[Endpoint]) -> usize {
        0
    }
}

/// Strategy name as it appears in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    RoundRobin,
    FirstAvailable,
}

impl Strategy {
    pub fn build(self) -> Box<dyn SelectionStrategy> {
        match self {
            Strategy::RoundRobin => Box::new(RoundRobin::new()),
            Strategy::FirstAvailable => Box::new(FirstAvailable),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown strategy {0:?} (expected \"round-robin\" or \"first\")")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "round-robin" | "round_robin" | "roundrobin" => Ok(Strategy::RoundRobin),
            "first" => Ok(Strategy::FirstAvailable),
            _ => Err(UnknownStrategy(s.to_owned())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::RoundRobin => f.write_str("round-robin"),
            Strategy::FirstAvailable => f.write_str("first"),
        }
    }
}

/// Resolves a service name to one endpoint currently known to the registry.
pub struct EndpointSelector {
    registry: Arc<dyn EndpointRegistry>,
    strategy: Box<dyn SelectionStrategy>,
}

impl EndpointSelector {
    pub fn new(registry: Arc<dyn EndpointRegistry>, strategy: Box<dyn SelectionStrategy>) -> Self {
        Self { registry, strategy }
    }

    pub fn round_robin(registry: Arc<dyn EndpointRegistry>) -> Self {
        Self::new(registry, Box::new(RoundRobin::new()))
    }

    /// Select an endpoint for `service` from a fresh registry snapshot.
    /// Fails without touching strategy state when the snapshot is empty.
    pub fn select(&self, service: &ServiceName) -> Result<Endpoint, SelectError> {
        let mut candidates = self.registry.list_endpoints(service);
        if candidates.is_empty() {
            return Err(SelectError::NoEndpoints(service.clone()));
        }
        let index = self.strategy.choose(service, &candidates) % candidates.len();
        Ok(candidates.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_discovery::StaticRegistry;

    fn three() -> Vec<Endpoint> {
        vec![
            Endpoint::new("10.0.0.1", 8080),
            Endpoint::new("10.0.0.2", 8080),
            Endpoint::new("10.0.0.3", 8080),
        ]
    }

    fn selector_with(endpoints: Vec<Endpoint>) -> (Arc<StaticRegistry>, EndpointSelector) {
        let registry = Arc::new(StaticRegistry::new());
        registry.replace(ServiceName::new("provider"), endpoints);
        let selector = EndpointSelector::round_robin(registry.clone());
        (registry, selector)
    }

    #[test]
    fn round_robin_visits_each_once_then_wraps() {
        let (_reg, selector) = selector_with(three());
        let svc = ServiceName::new("provider");
        let picked: Vec<Endpoint> = (0..3).map(|_| selector.select(&svc).unwrap()).collect();
        assert_eq!(picked, three());
        assert_eq!(selector.select(&svc).unwrap(), three()[0]);
    }

    #[test]
    fn empty_set_fails_without_advancing() {
        let (reg, selector) = selector_with(three());
        let svc = ServiceName::new("provider");
        assert_eq!(selector.select(&svc).unwrap(), three()[0]);

        reg.replace(svc.clone(), Vec::new());
        assert_eq!(
            selector.select(&svc),
            Err(SelectError::NoEndpoints(svc.clone()))
        );
        assert_eq!(
            selector.select(&svc),
            Err(SelectError::NoEndpoints(svc.clone()))
        );

        reg.replace(svc.clone(), three());
        assert_eq!(selector.select(&svc).unwrap(), three()[1]);
    }

    #[test]
    fn never_returns_removed_endpoint() {
        let (reg, selector) = selector_with(three());
        let svc = ServiceName::new("provider");
        selector.select(&svc).unwrap();
        selector.select(&svc).unwrap();
        reg.deregister(&svc, &three()[2]);
        for _ in 0..5 {
            assert_ne!(selector.select(&svc).unwrap(), three()[2]);
        }
    }

    #[test]
    fn cursors_are_per_service() {
        let registry = Arc::new(StaticRegistry::new());
        registry.replace(ServiceName::new("a"), three());
        registry.replace(ServiceName::new("b"), three());
        let selector = EndpointSelector::round_robin(registry);
        assert_eq!(selector.select(&ServiceName::new("a")).unwrap(), three()[0]);
        assert_eq!(selector.select(&ServiceName::new("a")).unwrap(), three()[1]);
        assert_eq!(selector.select(&ServiceName::new("b")).unwrap(), three()[0]);
    }

    #[test]
    fn first_available_is_deterministic() {
        let registry = Arc::new(StaticRegistry::new());
        registry.replace(ServiceName::new("provider"), three());
        let selector = EndpointSelector::new(registry, Strategy::FirstAvailable.build());
        for _ in 0..4 {
            assert_eq!(selector.select(&ServiceName::new("provider")).unwrap(), three()[0]);
        }
    }

    #[test]
    fn concurrent_selects_keep_the_cursor_consistent() {
        let (_reg, selector) = selector_with(three());
        let selector = Arc::new(selector);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&selector);
                std::thread::spawn(move || {
                    for _ in 0..30 {
                        s.select(&ServiceName::new("provider")).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // 120 selections over 3 endpoints leave the cursor back at the start.
        assert_eq!(
            selector.select(&ServiceName::new("provider")).unwrap(),
            three()[0]
        );
    }

    #[test]
    fn strategy_names() {
        assert_eq!("round-robin".parse::<Strategy>().unwrap(), Strategy::RoundRobin);
        assert_eq!("First".parse::<Strategy>().unwrap(), Strategy::FirstAvailable);
        assert!("random".parse::<Strategy>().is_err());
        assert_eq!(Strategy::RoundRobin.to_string(), "round-robin");
    }
}
