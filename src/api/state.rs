use crate::commands::CommandSurface;
use crate::monitor::MonitorHandle;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub commands: CommandSurface,

    /// Scheduler handle for on-demand cycles, absent in tests that drive the
    /// core directly
    pub scheduler: Option<MonitorHandle>,
}

impl ApiState {
    pub fn new(commands: CommandSurface, scheduler: Option<MonitorHandle>) -> Self {
        Self {
            commands,
            scheduler,
        }
    }
}
