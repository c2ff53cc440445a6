//! Message types for the scheduler actor
//!
//! 1. **Commands**: sent to the actor via mpsc, replies via oneshot
//! 2. **Events**: one [`CycleReport`] broadcast per finished cycle

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

/// Commands that can be sent to the MonitorActor
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run a cycle now (bypassing the interval timer)
    ///
    /// Queued behind a cycle that is already running.
    RunNow {
        respond_to: oneshot::Sender<CycleReport>,
    },

    /// Update the cycle interval
    ///
    /// The next cycle runs one full new interval from now.
    UpdateInterval { interval_secs: u64 },

    /// Stop after the current cycle
    Shutdown,
}

/// Summary of one monitor cycle, broadcast after the cycle finished
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// Monotonic cycle number, starting at 1
    pub cycle: u64,

    pub started_at: DateTime<Utc>,

    pub duration_ms: u64,

    /// Endpoints in the snapshot the cycle worked on
    pub probed: usize,

    pub alive: usize,

    pub failed: usize,

    /// Results dropped because the endpoint was removed mid-cycle
    pub skipped: usize,

    /// Names of endpoints that entered `Down` this cycle
    pub went_down: Vec<String>,

    /// Names of endpoints that left `Down` this cycle
    pub recovered: Vec<String>,

    /// Alerts handed to the notification sink successfully
    pub alerts_sent: usize,

    pub alert_failures: usize,

    /// Whether the status display was updated
    pub display_refreshed: bool,
}
