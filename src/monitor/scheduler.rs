//! MonitorActor - drives monitor cycles on a fixed interval
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick ─┐
//!             ├─→ MonitorCore::run_cycle → CycleReport → broadcast
//! RunNow ─────┘
//!     ↑
//!     └─── Commands (RunNow, UpdateInterval, Shutdown)
//! ```
//!
//! Cycles never overlap: the actor runs one cycle at a time and ticks that
//! fire while a cycle is running are delayed, not queued. A shutdown signal
//! abandons the running cycle; because results are applied in one step at
//! the end of a cycle, the registry never sees half a cycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, warn};

use super::core::MonitorCore;
use super::messages::{CycleReport, MonitorCommand};
use crate::config::MIN_INTERVAL_SECS;

/// Actor owning the cycle timer
pub struct MonitorActor {
    core: Arc<MonitorCore>,

    command_rx: mpsc::Receiver<MonitorCommand>,

    /// Set to `true` to stop immediately
    shutdown_rx: watch::Receiver<bool>,

    /// Broadcast sender for finished cycles
    event_tx: broadcast::Sender<CycleReport>,

    interval_duration: Duration,
}

fn cycle_timer(period: Duration, start: Instant) -> Interval {
    let mut ticker = interval_at(start, period.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

impl MonitorActor {
    pub fn new(
        core: Arc<MonitorCore>,
        command_rx: mpsc::Receiver<MonitorCommand>,
        shutdown_rx: watch::Receiver<bool>,
        event_tx: broadcast::Sender<CycleReport>,
    ) -> Self {
        let interval_duration = core.settings().interval;

        Self {
            core,
            command_rx,
            shutdown_rx,
            event_tx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// The first cycle starts right away. The loop ends on a shutdown
    /// signal, a Shutdown command, or when every handle is gone.
    #[instrument(skip(self), fields(interval = ?self.interval_duration))]
    pub async fn run(mut self) {
        info!("starting monitor scheduler");

        let mut ticker = cycle_timer(self.interval_duration, Instant::now());

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    debug!("shutdown signalled");
                    break;
                }

                _ = ticker.tick() => {
                    if self.cycle().await.is_none() {
                        break;
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        MonitorCommand::RunNow { respond_to } => {
                            debug!("received RunNow command");
                            match self.cycle().await {
                                Some(report) => {
                                    let _ = respond_to.send(report);
                                }
                                None => break,
                            }
                        }

                        MonitorCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            ticker = ticker_from_now(self.interval_duration);
                        }

                        MonitorCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        info!("monitor scheduler stopped");
    }

    /// Run one cycle unless shutdown is signalled first. `None` means the
    /// cycle was abandoned.
    async fn cycle(&mut self) -> Option<CycleReport> {
        let core = Arc::clone(&self.core);

        tokio::select! {
            report = core.run_cycle() => {
                // no subscribers is fine
                let _ = self.event_tx.send(report.clone());
                Some(report)
            }
            _ = self.shutdown_rx.changed() => {
                debug!("abandoning running cycle");
                None
            }
        }
    }
}

fn ticker_from_now(period: Duration) -> Interval {
    cycle_timer(period, Instant::now() + period)
}

/// Handle for controlling the MonitorActor
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
    shutdown: Arc<watch::Sender<bool>>,
    events: broadcast::Sender<CycleReport>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
    core: Arc<MonitorCore>,
}

impl MonitorHandle {
    /// Spawn the scheduler for `core`
    pub fn spawn(core: Arc<MonitorCore>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (event_tx, _) = broadcast::channel(64);

        let actor = MonitorActor::new(Arc::clone(&core), cmd_rx, shutdown_rx, event_tx.clone());
        let task = tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            shutdown: Arc::new(shutdown_tx),
            events: event_tx,
            task: Arc::new(Mutex::new(Some(task))),
            core,
        }
    }

    /// Run a cycle now and wait for its report
    ///
    /// Queued behind a cycle that is already running.
    pub async fn run_now(&self) -> Result<CycleReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::RunNow { respond_to: tx })
            .await
            .context("failed to send RunNow command")?;

        rx.await.context("cycle was abandoned")
    }

    /// Change the cycle interval; the next cycle runs one interval from now
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        if interval_secs < MIN_INTERVAL_SECS {
            bail!("interval must be at least {MIN_INTERVAL_SECS} seconds");
        }

        self.sender
            .send(MonitorCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Receive a report for every finished cycle
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.events.subscribe()
    }

    pub fn core(&self) -> &Arc<MonitorCore> {
        &self.core
    }

    /// Stop after the running cycle, if any, completes
    pub async fn stop(&self) -> Result<()> {
        self.sender
            .send(MonitorCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        self.join().await;
        Ok(())
    }

    /// Stop now, abandoning a running cycle, and wait for the actor to exit
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        self.join().await;
    }

    async fn join(&self) {
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                warn!("monitor scheduler task failed: {e}");
            }
        }
    }
}
