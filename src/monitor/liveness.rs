//! Per-endpoint liveness state machine
//!
//! ```text
//!              success                     success
//!   Unknown ───────────► Up ◄──────────────────────────────┐
//!      │                 │ ▲                                │
//!      │ failure         │ │ success (blip, no alert)       │ success (recovered)
//!      ▼                 ▼ │                                │
//!   DownPending ◄────────┘ │                                │
//!      │    failure        │                                │
//!      └───────────────────┴── failure ──► Down ────────────┘
//!                                (alert)    │ ▲
//!                                           └─┘ failure (no repeat)
//! ```
//!
//! A single missed probe moves an endpoint to `DownPending` without alerting;
//! the second consecutive miss moves it to `Down` and fires exactly one alert.
//! A sustained outage never alerts again until the endpoint has been `Up`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessState {
    /// Added but not probed yet
    #[default]
    Unknown,

    Up,

    /// One failed probe, alert held back
    DownPending,

    /// Confirmed down, alert already sent
    Down,
}

/// Side effect of feeding one probe outcome into the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to report
    None,

    /// Entered `Down`; the alert must fire
    WentDown,

    /// Left `Down` for `Up`
    Recovered,
}

impl LivenessState {
    /// Advance the machine by one probe outcome
    pub fn advance(self, success: bool) -> (LivenessState, Transition) {
        use LivenessState::*;

        match (self, success) {
            (Unknown | Up | DownPending, true) => (Up, Transition::None),
            (Down, true) => (Up, Transition::Recovered),
            (Unknown | Up, false) => (DownPending, Transition::None),
            (DownPending, false) => (Down, Transition::WentDown),
            (Down, false) => (Down, Transition::None),
        }
    }

    /// Whether the endpoint counts as online for display purposes
    pub fn is_alive(self) -> bool {
        self == LivenessState::Up
    }
}
