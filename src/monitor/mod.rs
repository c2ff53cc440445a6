//! The monitor: liveness tracking, cycles and their scheduling
//!
//! ## Architecture Overview
//!
//! ```text
//!   MonitorHandle ──commands──► MonitorActor ──run_cycle──► MonitorCore
//!        │                                                   │   │   │
//!        └── subscribe ◄── CycleReport broadcast             │   │   └─► NotificationSink
//!                                                            │   └─────► DisplaySink
//!   CommandSurface / HTTP API ─────── add/remove/set ────────┴─────────► ConfigStore
//! ```
//!
//! [`MonitorCore`] holds all state; the actor only decides *when* a cycle
//! runs.

pub mod configuration;
pub mod core;
pub mod liveness;
pub mod messages;
pub mod scheduler;

pub use configuration::{
    DEFAULT_ALERT_TEMPLATE, DisplayDestination, MonitorConfiguration, SERVER_PLACEHOLDER,
    render_alert,
};
pub use core::{
    Acknowledged, CoreError, EndpointSummary, MonitorCore, MonitorParts, MonitorSettings,
    StatusView,
};
pub use liveness::{LivenessState, Transition};
pub use messages::{CycleReport, MonitorCommand};
pub use scheduler::{MonitorActor, MonitorHandle};
