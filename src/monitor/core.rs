//! MonitorCore - owned monitor state and its mutation entry points
//!
//! The core owns the [`Registry`] and the [`MonitorConfiguration`]. It is
//! shared behind an `Arc` by the scheduler actor, the command surface and
//! the HTTP API; there is no other copy of this state in the process.
//!
//! ## Locking
//!
//! - `writer`: every mutation (command or cycle result) runs inside this
//!   gate, so exactly one writer section is active at a time and persisted
//!   state follows the order in which commands were acknowledged
//! - `cycle_gate`: held for a whole cycle; a second cycle waits for the
//!   first one to complete
//! - `display_gate`: serialises moves of the status message. The chat
//!   round-trips happen under this gate only; `writer` is taken just to
//!   commit the new destination
//!
//! Snapshot reads take neither gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, trace, warn};

use super::configuration::{DEFAULT_ALERT_TEMPLATE, MonitorConfiguration};
use super::liveness::Transition;
use super::messages::CycleReport;
use crate::probe::{EndpointAddress, EndpointProbe, ProbeFailure, ProbeResult};
use crate::registry::{
    AppliedProbe, Endpoint, ProbeOutcome, Registry, RegistryError, RegistrySnapshot,
};
use crate::sinks::{DisplaySink, NotificationSink, SinkError, SinkResult};
use crate::storage::{ConfigStore, StorageError, StoredEndpoint, StoredState};
use crate::{ChannelId, MessageId};

/// Extra time granted on top of the probe timeout before the core gives up
/// on a probe itself
const PROBE_DEADLINE_SLACK: Duration = Duration::from_secs(1);

/// Tuning knobs of the monitor
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Time between two cycles
    pub interval: Duration,

    /// Bound for a single probe
    pub probe_timeout: Duration,

    /// Probes in flight at the same time
    pub max_concurrent_probes: usize,

    /// Alert text used until one is set through a command
    pub alert_template: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            probe_timeout: Duration::from_secs(5),
            max_concurrent_probes: 8,
            alert_template: DEFAULT_ALERT_TEMPLATE.to_string(),
        }
    }
}

/// External collaborators the core calls into
#[derive(Clone)]
pub struct MonitorParts {
    pub store: Arc<dyn ConfigStore>,
    pub probe: Arc<dyn EndpointProbe>,
    pub display: Arc<dyn DisplaySink>,
    pub notifier: Arc<dyn NotificationSink>,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A sink call the command depends on failed
    #[error("chat platform error: {0}")]
    Sink(#[from] SinkError),

    /// Only returned while booting
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a state-changing command
///
/// The in-memory change always took effect. `persistence_error` is set when
/// the durable write failed, in which case the change may not survive a
/// restart.
#[derive(Debug)]
pub struct Acknowledged<T> {
    pub value: T,
    pub persistence_error: Option<StorageError>,
}

impl<T> Acknowledged<T> {
    pub fn persisted(&self) -> bool {
        self.persistence_error.is_none()
    }
}

/// Address and name of an endpoint, as offered for autocompletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSummary {
    pub address: String,
    pub name: String,
}

/// Consistent view of registry and configuration
#[derive(Debug, Clone)]
pub struct StatusView {
    pub snapshot: RegistrySnapshot,
    pub config: MonitorConfiguration,
}

pub struct MonitorCore {
    registry: Registry,
    config: RwLock<MonitorConfiguration>,
    writer: Mutex<()>,
    cycle_gate: Mutex<()>,
    display_gate: Mutex<()>,
    cycles: AtomicU64,
    parts: MonitorParts,
    settings: MonitorSettings,
}

impl MonitorCore {
    /// Build the core from durable state.
    ///
    /// Failing to load is fatal; stored endpoints that no longer parse are
    /// skipped with a warning.
    #[instrument(skip_all)]
    pub async fn bootstrap(settings: MonitorSettings, parts: MonitorParts) -> Result<Self, CoreError> {
        info!("loading monitor state from {}", parts.store.describe());
        let StoredState { mut config, endpoints } = parts.store.load().await?;

        if config.alert_channel.is_none() || config.alert_template.trim().is_empty() {
            config.alert_template = settings.alert_template.clone();
        }

        let registry = Registry::new();
        for StoredEndpoint { address, name } in endpoints {
            if let Err(e) = registry.add(&address, &name).await {
                warn!("skipping stored endpoint {address}: {e}");
            }
        }

        info!("monitoring {} endpoints", registry.len().await);

        Ok(Self {
            registry,
            config: RwLock::new(config),
            writer: Mutex::new(()),
            cycle_gate: Mutex::new(()),
            display_gate: Mutex::new(()),
            cycles: AtomicU64::new(0),
            parts,
            settings,
        })
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn configuration(&self) -> MonitorConfiguration {
        self.config.read().await.clone()
    }

    // ========================================================================
    // Command entry points
    // ========================================================================

    /// Start monitoring `address` under `name`
    #[instrument(skip(self))]
    pub async fn add_endpoint(&self, address: &str, name: &str) -> Result<Acknowledged<()>, CoreError> {
        let persistence_error = {
            let _writer = self.writer.lock().await;
            self.registry.add(address, name).await?;
            self.persist().await
        };

        self.refresh_display_logged().await;
        Ok(Acknowledged {
            value: (),
            persistence_error,
        })
    }

    /// Stop monitoring `address`, returning the name it had
    #[instrument(skip(self))]
    pub async fn remove_endpoint(&self, address: &str) -> Result<Acknowledged<String>, CoreError> {
        let (name, persistence_error) = {
            let _writer = self.writer.lock().await;
            let name = self.registry.remove(address).await?;
            (name, self.persist().await)
        };

        self.refresh_display_logged().await;
        Ok(Acknowledged {
            value: name,
            persistence_error,
        })
    }

    /// Endpoints whose address starts with `prefix`
    pub async fn list_endpoints(&self, prefix: &str) -> Vec<EndpointSummary> {
        self.registry
            .list(prefix)
            .await
            .into_iter()
            .map(|(address, name)| EndpointSummary { address, name })
            .collect()
    }

    /// Move the status message to `channel`.
    ///
    /// The new message is posted first; only then is the old one retracted,
    /// so a failure leaves the previous display untouched.
    #[instrument(skip(self))]
    pub async fn set_display_destination(
        &self,
        channel: ChannelId,
    ) -> Result<Acknowledged<MessageId>, CoreError> {
        let _display = self.display_gate.lock().await;

        let previous = self.configuration().await;
        let snapshot = self.registry.snapshot().await;
        let rendered = self.parts.display.render(&snapshot, &previous);

        let message = self.parts.display.create(channel, &rendered).await?;
        debug!("posted status message {message} in channel {channel}");

        if let Some(old) = previous.display_destination() {
            match self.parts.display.retract(&old).await {
                Ok(()) => debug!("removed old status message {}", old.message),
                Err(SinkError::NotFound(_)) => trace!("old status message already gone"),
                Err(e) => warn!("failed to remove old status message: {e}"),
            }
        }

        let _writer = self.writer.lock().await;
        {
            let mut config = self.config.write().await;
            config.display_channel = Some(channel);
            config.display_message = Some(message);
        }

        Ok(Acknowledged {
            value: message,
            persistence_error: self.persist().await,
        })
    }

    /// Send alerts to `channel` using `template` (`{server}` placeholder).
    /// Returns the template that was stored.
    #[instrument(skip(self))]
    pub async fn set_alert_destination(
        &self,
        channel: ChannelId,
        template: &str,
    ) -> Acknowledged<String> {
        let _writer = self.writer.lock().await;

        let template = match template.trim() {
            "" => self.settings.alert_template.as_str(),
            template => template,
        };

        {
            let mut config = self.config.write().await;
            config.alert_channel = Some(channel);
            config.alert_template = template.to_string();
        }

        Acknowledged {
            value: template.to_string(),
            persistence_error: self.persist().await,
        }
    }

    /// Flip the show-address flag, returning the new value
    #[instrument(skip(self))]
    pub async fn toggle_show_address(&self) -> Acknowledged<bool> {
        let (show_address, persistence_error) = {
            let _writer = self.writer.lock().await;
            let show_address = {
                let mut config = self.config.write().await;
                config.show_address = !config.show_address;
                config.show_address
            };
            (show_address, self.persist().await)
        };

        self.refresh_display_logged().await;
        Acknowledged {
            value: show_address,
            persistence_error,
        }
    }

    pub async fn status_snapshot(&self) -> StatusView {
        StatusView {
            snapshot: self.registry.snapshot().await,
            config: self.configuration().await,
        }
    }

    pub async fn get_endpoint(&self, address: &str) -> Option<Endpoint> {
        self.registry.get(address).await
    }

    /// Write the complete state through to storage. Callers hold `writer`.
    async fn persist(&self) -> Option<StorageError> {
        let state = StoredState {
            config: self.config.read().await.clone(),
            endpoints: self
                .registry
                .snapshot()
                .await
                .iter()
                .map(|e| StoredEndpoint {
                    address: e.address.clone(),
                    name: e.name.clone(),
                })
                .collect(),
        };

        match self.parts.store.save(&state).await {
            Ok(()) => None,
            Err(e) => {
                warn!("failed to persist monitor state, change may not survive a restart: {e}");
                Some(e)
            }
        }
    }

    // ========================================================================
    // Display
    // ========================================================================

    /// Re-render the status message. `Ok(false)` when no display is set up.
    pub async fn refresh_display(&self) -> SinkResult<bool> {
        let config = self.configuration().await;
        let Some(destination) = config.display_destination() else {
            trace!("no status message configured");
            return Ok(false);
        };

        let snapshot = self.registry.snapshot().await;
        let rendered = self.parts.display.render(&snapshot, &config);
        self.parts.display.publish(&rendered, &destination).await?;

        Ok(true)
    }

    async fn refresh_display_logged(&self) -> bool {
        match self.refresh_display().await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!("failed to update status message: {e}");
                false
            }
        }
    }

    // ========================================================================
    // Cycle
    // ========================================================================

    /// Run one monitor cycle: probe every endpoint, fold the results into
    /// the registry, send alerts for fresh outages and refresh the display.
    ///
    /// Probe results are applied in one step after all probes finished. A
    /// cycle that is dropped halfway (shutdown) leaves the registry as it was.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> CycleReport {
        let _cycle = self.cycle_gate.lock().await;

        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = Utc::now();
        let start = Instant::now();

        let snapshot = self.registry.snapshot().await;
        debug!("cycle {cycle}: probing {} endpoints", snapshot.len());

        let outcomes = self.probe_all(&snapshot).await;

        let applied = {
            let _writer = self.writer.lock().await;
            self.registry.apply_probe_results(&outcomes).await
        };

        let alive = outcomes.iter().filter(|o| o.result.is_success()).count();
        let mut report = CycleReport {
            cycle,
            started_at,
            probed: snapshot.len(),
            alive,
            failed: outcomes.len() - alive,
            skipped: outcomes.len() - applied.len(),
            ..Default::default()
        };

        self.dispatch_transitions(&applied, &mut report).await;
        report.display_refreshed = self.refresh_display_logged().await;
        report.duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            "cycle {cycle} finished in {}ms: {} alive, {} failed, {} alerts",
            report.duration_ms, report.alive, report.failed, report.alerts_sent
        );

        report
    }

    async fn probe_all(&self, snapshot: &RegistrySnapshot) -> Vec<ProbeOutcome> {
        let deadline = self.settings.probe_timeout + PROBE_DEADLINE_SLACK;

        // each future owns what it touches so the cycle stays Send
        let probes: Vec<_> = snapshot
            .iter()
            .map(|endpoint| {
                let probe = Arc::clone(&self.parts.probe);
                let address = endpoint.address.clone();
                let generation = endpoint.generation();

                async move {
                    let result = match address.parse::<EndpointAddress>() {
                        Ok(parsed) => tokio::time::timeout(deadline, probe.probe(&parsed))
                            .await
                            .unwrap_or(ProbeResult::failed(ProbeFailure::TimedOut)),
                        Err(e) => {
                            warn!("{address}: {e}");
                            ProbeResult::failed(ProbeFailure::Unreachable)
                        }
                    };
                    trace!("{address}: {result:?}");

                    ProbeOutcome {
                        address,
                        generation,
                        result,
                    }
                }
            })
            .collect();

        stream::iter(probes)
            .buffer_unordered(self.settings.max_concurrent_probes.max(1))
            .collect()
            .await
    }

    async fn dispatch_transitions(&self, applied: &[AppliedProbe], report: &mut CycleReport) {
        let config = self.configuration().await;

        for probe in applied {
            match probe.transition {
                Transition::None => {}
                Transition::WentDown => {
                    info!("{} ({}) is down", probe.name, probe.address);
                    report.went_down.push(probe.name.clone());

                    let Some(channel) = config.alert_channel else {
                        debug!("no alert channel configured, not alerting");
                        continue;
                    };

                    match self
                        .parts
                        .notifier
                        .notify(channel, &probe.name, &config.alert_template)
                        .await
                    {
                        Ok(()) => report.alerts_sent += 1,
                        Err(e) => {
                            warn!("failed to send alert for {}: {e}", probe.name);
                            report.alert_failures += 1;
                        }
                    }
                }
                Transition::Recovered => {
                    info!("{} ({}) recovered", probe.name, probe.address);
                    report.recovered.push(probe.name.clone());

                    if let Some(channel) = config.alert_channel {
                        if let Err(e) = self
                            .parts
                            .notifier
                            .notify_recovered(channel, &probe.name)
                            .await
                        {
                            warn!("failed to send recovery notice for {}: {e}", probe.name);
                        }
                    }
                }
            }
        }
    }
}
