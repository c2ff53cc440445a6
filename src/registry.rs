//! Registry of monitored endpoints
//!
//! The registry is the authoritative in-memory map from endpoint address to
//! its current state. Reads hand out [`RegistrySnapshot`]s, immutable copies
//! that can be iterated without holding any lock while the registry keeps
//! changing underneath.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::monitor::liveness::{LivenessState, Transition};
use crate::probe::{AddressError, EndpointAddress, ProbeFailure, ProbeResult};

/// Player count reported by a live server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    pub online: u32,
    pub max: u32,
}

impl std::fmt::Display for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.online, self.max)
    }
}

/// A monitored game server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    /// Unique key, as entered by the user
    pub address: String,

    /// Display name
    pub name: String,

    pub state: LivenessState,

    /// Last known population, `None` until the first successful probe
    pub population: Option<Population>,

    pub consecutive_failures: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<ProbeFailure>,

    /// Insertion order, used to keep display order stable. Never reused, so
    /// it also tells a re-added endpoint apart from the one it replaced.
    #[serde(skip)]
    position: u64,
}

impl Endpoint {
    fn new(address: String, name: String, position: u64) -> Self {
        Self {
            address,
            name,
            state: LivenessState::Unknown,
            population: None,
            consecutive_failures: 0,
            last_checked: None,
            last_failure: None,
            position,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    /// Identifies this registration of the address
    pub fn generation(&self) -> u64 {
        self.position
    }

    fn apply(&mut self, result: &ProbeResult, at: DateTime<Utc>) -> Transition {
        let (state, transition) = self.state.advance(result.is_success());
        self.state = state;
        self.last_checked = Some(at);

        match result {
            ProbeResult::Alive {
                online_players,
                max_players,
            } => {
                self.population = Some(Population {
                    online: *online_players,
                    max: *max_players,
                });
                self.consecutive_failures = 0;
                self.last_failure = None;
            }
            ProbeResult::Failed { failure } => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.last_failure = Some(*failure);
            }
        }

        transition
    }
}

/// Errors returned by registry mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} is already being monitored")]
    DuplicateEndpoint(String),

    #[error("{0} is not being monitored")]
    UnknownEndpoint(String),

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
}

/// Result of applying one probe outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedProbe {
    pub address: String,
    pub name: String,
    pub state: LivenessState,
    pub transition: Transition,
}

/// Probe outcome for the endpoint registration seen in a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub address: String,
    pub generation: u64,
    pub result: ProbeResult,
}

/// Immutable point-in-time copy of the registry, in insertion order
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    endpoints: Arc<[Endpoint]>,
}

impl RegistrySnapshot {
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[derive(Debug, Default)]
struct Inner {
    endpoints: HashMap<String, Endpoint>,
    next_position: u64,
}

/// The endpoint registry
#[derive(Debug, Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new endpoint in state `Unknown`
    pub async fn add(&self, address: &str, name: &str) -> Result<(), RegistryError> {
        let address = address.trim();
        address.parse::<EndpointAddress>()?;

        let mut inner = self.inner.write().await;
        if inner.endpoints.contains_key(address) {
            return Err(RegistryError::DuplicateEndpoint(address.to_string()));
        }

        let position = inner.next_position;
        inner.next_position += 1;
        inner.endpoints.insert(
            address.to_string(),
            Endpoint::new(address.to_string(), name.trim().to_string(), position),
        );

        debug!("added endpoint {address} ({name})");
        Ok(())
    }

    /// Remove an endpoint, returning its display name
    pub async fn remove(&self, address: &str) -> Result<String, RegistryError> {
        let address = address.trim();
        let mut inner = self.inner.write().await;

        let endpoint = inner
            .endpoints
            .remove(address)
            .ok_or_else(|| RegistryError::UnknownEndpoint(address.to_string()))?;

        debug!("removed endpoint {address} ({})", endpoint.name);
        Ok(endpoint.name)
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.read().await;
        let mut endpoints: Vec<Endpoint> = inner.endpoints.values().cloned().collect();
        endpoints.sort_by_key(|e| e.position);

        RegistrySnapshot {
            endpoints: endpoints.into(),
        }
    }

    /// Fold one probe outcome into the endpoint's state.
    ///
    /// Returns `None` when the endpoint was removed after the probe started.
    pub async fn apply_probe_result(
        &self,
        address: &str,
        result: &ProbeResult,
    ) -> Option<AppliedProbe> {
        let mut inner = self.inner.write().await;
        Self::apply_locked(&mut inner, address, None, result, Utc::now())
    }

    /// Apply a whole cycle's outcomes under a single lock acquisition.
    ///
    /// An outcome only lands on the registration it was taken from; results
    /// for endpoints removed (or removed and re-added) in the meantime are
    /// dropped.
    pub async fn apply_probe_results(&self, outcomes: &[ProbeOutcome]) -> Vec<AppliedProbe> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        outcomes
            .iter()
            .filter_map(|outcome| {
                Self::apply_locked(
                    &mut inner,
                    &outcome.address,
                    Some(outcome.generation),
                    &outcome.result,
                    now,
                )
            })
            .collect()
    }

    fn apply_locked(
        inner: &mut Inner,
        address: &str,
        generation: Option<u64>,
        result: &ProbeResult,
        at: DateTime<Utc>,
    ) -> Option<AppliedProbe> {
        let Some(endpoint) = inner.endpoints.get_mut(address) else {
            trace!("{address} was removed while being probed, dropping result");
            return None;
        };

        if generation.is_some_and(|g| g != endpoint.position) {
            trace!("{address} was re-added while being probed, dropping result");
            return None;
        }

        let transition = endpoint.apply(result, at);

        Some(AppliedProbe {
            address: endpoint.address.clone(),
            name: endpoint.name.clone(),
            state: endpoint.state,
            transition,
        })
    }

    /// `(address, name)` pairs whose address starts with `prefix`, in
    /// insertion order
    pub async fn list(&self, prefix: &str) -> Vec<(String, String)> {
        self.snapshot()
            .await
            .iter()
            .filter(|e| e.address.starts_with(prefix))
            .map(|e| (e.address.clone(), e.name.clone()))
            .collect()
    }

    pub async fn get(&self, address: &str) -> Option<Endpoint> {
        self.inner.read().await.endpoints.get(address.trim()).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.endpoints.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
