//! Outbound side effects of the monitor
//!
//! The core never talks to the chat platform directly. It renders a
//! [`RenderedStatus`] and hands it to a [`DisplaySink`], and it reports down
//! transitions to a [`NotificationSink`]. Both are fire-and-log: a failing
//! sink never stops a cycle and is never retried inside it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::monitor::{DisplayDestination, LivenessState, MonitorConfiguration};
use crate::registry::{Endpoint, RegistrySnapshot};
use crate::{ChannelId, MessageId};

/// Result type alias for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The target message or channel no longer exists
    #[error("target not found: {0}")]
    NotFound(String),

    /// The platform rejected the request
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never completed
    #[error("delivery failed: {0}")]
    Transport(String),

    /// The platform answered with something unexpected
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SinkError::InvalidResponse(err.to_string())
        } else {
            SinkError::Transport(err.to_string())
        }
    }
}

/// Platform-neutral rendering of a registry snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedStatus {
    pub title: String,
    pub entries: Vec<StatusEntry>,
    pub generated_at: DateTime<Utc>,
}

/// One line of the status display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub label: String,
    pub value: String,
    pub online: bool,
}

pub const STATUS_TITLE: &str = "Server Status";

impl RenderedStatus {
    /// Render every endpoint of `snapshot`, honouring the show-address flag
    pub fn from_snapshot(snapshot: &RegistrySnapshot, config: &MonitorConfiguration) -> Self {
        Self::build(snapshot, config.show_address, true)
    }

    /// Variant used for on-demand status queries: addresses always shown,
    /// no player counts
    pub fn for_query(snapshot: &RegistrySnapshot) -> Self {
        Self::build(snapshot, true, false)
    }

    fn build(snapshot: &RegistrySnapshot, show_address: bool, with_players: bool) -> Self {
        let entries = snapshot
            .iter()
            .map(|endpoint| StatusEntry {
                label: entry_label(endpoint, show_address),
                value: entry_value(endpoint, with_players),
                online: endpoint.is_alive(),
            })
            .collect();

        Self {
            title: STATUS_TITLE.to_string(),
            entries,
            generated_at: Utc::now(),
        }
    }
}

fn entry_label(endpoint: &Endpoint, show_address: bool) -> String {
    if show_address {
        format!("{} ({})", endpoint.name, endpoint.address)
    } else {
        endpoint.name.clone()
    }
}

fn entry_value(endpoint: &Endpoint, with_players: bool) -> String {
    match endpoint.state {
        LivenessState::Up => match (with_players, endpoint.population) {
            (true, Some(population)) => format!("🟢 Online {population}"),
            (true, None) => "🟢 Online ?/?".to_string(),
            (false, _) => "🟢 Online".to_string(),
        },
        LivenessState::Unknown => "⚪ Checking...".to_string(),
        LivenessState::DownPending | LivenessState::Down => "🔴 Offline".to_string(),
    }
}

/// Consumer of rendered status displays
#[async_trait]
pub trait DisplaySink: Send + Sync {
    /// Turn a snapshot into something publishable
    fn render(&self, snapshot: &RegistrySnapshot, config: &MonitorConfiguration) -> RenderedStatus {
        RenderedStatus::from_snapshot(snapshot, config)
    }

    /// Replace the content of an existing status message
    async fn publish(
        &self,
        rendered: &RenderedStatus,
        destination: &DisplayDestination,
    ) -> SinkResult<()>;

    /// Post a new status message, returning its id
    async fn create(&self, channel: ChannelId, rendered: &RenderedStatus) -> SinkResult<MessageId>;

    /// Delete a status message that is no longer tracked
    async fn retract(&self, destination: &DisplayDestination) -> SinkResult<()>;
}

/// Consumer of alert notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// An endpoint was confirmed down. `template` contains `{server}`.
    async fn notify(&self, channel: ChannelId, endpoint_name: &str, template: &str)
    -> SinkResult<()>;

    /// An endpoint left `Down`. Does nothing unless a sink opts in.
    async fn notify_recovered(&self, _channel: ChannelId, _endpoint_name: &str) -> SinkResult<()> {
        Ok(())
    }
}
