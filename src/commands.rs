//! User commands and their replies
//!
//! Each method mirrors one chat command. Replies are short confirmation
//! strings; when the durable write failed the reply says so, since the change
//! is live but would be lost on restart.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::ChannelId;
use crate::monitor::{Acknowledged, CoreError, MonitorCore};
use crate::sinks::RenderedStatus;

/// Discord caps autocomplete results at 25 choices
pub const MAX_AUTOCOMPLETE_CHOICES: usize = 25;

pub const PERSISTENCE_WARNING: &str =
    "⚠️ The change could not be saved and may not survive a restart.";

/// Reply to a successful command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    pub message: String,

    /// `false` when the change is only held in memory
    pub persisted: bool,
}

impl CommandReply {
    fn from_ack<T>(ack: &Acknowledged<T>, message: String) -> Self {
        Self {
            message,
            persisted: ack.persisted(),
        }
    }

    /// Text shown to the user, including the persistence warning if needed
    pub fn text(&self) -> String {
        if self.persisted {
            self.message.clone()
        } else {
            format!("{}\n{PERSISTENCE_WARNING}", self.message)
        }
    }
}

/// Autocomplete entry: shows the name, submits the address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

#[derive(Clone)]
pub struct CommandSurface {
    core: Arc<MonitorCore>,
}

impl CommandSurface {
    pub fn new(core: Arc<MonitorCore>) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &Arc<MonitorCore> {
        &self.core
    }

    #[instrument(skip(self))]
    pub async fn add_server(&self, address: &str, name: &str) -> Result<CommandReply, CoreError> {
        let ack = self.core.add_endpoint(address, name).await?;
        Ok(CommandReply::from_ack(
            &ack,
            format!("Added {} ({}) to the list", name.trim(), address.trim()),
        ))
    }

    #[instrument(skip(self))]
    pub async fn remove_server(&self, address: &str) -> Result<CommandReply, CoreError> {
        let ack = self.core.remove_endpoint(address).await?;
        Ok(CommandReply::from_ack(
            &ack,
            format!("Removed {} ({}) from the list", ack.value, address.trim()),
        ))
    }

    /// Choices for the address argument of `remove_server`
    pub async fn autocomplete_addresses(&self, current: &str) -> Vec<Choice> {
        self.core
            .list_endpoints(current)
            .await
            .into_iter()
            .take(MAX_AUTOCOMPLETE_CHOICES)
            .map(|e| Choice {
                name: e.name,
                value: e.address,
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn set_channel(&self, channel: ChannelId) -> Result<CommandReply, CoreError> {
        let ack = self.core.set_display_destination(channel).await?;
        Ok(CommandReply::from_ack(
            &ack,
            format!("Set the channel to {}", channel.mention()),
        ))
    }

    #[instrument(skip(self))]
    pub async fn set_alert(&self, channel: ChannelId, message: &str) -> CommandReply {
        let ack = self.core.set_alert_destination(channel, message).await;

        CommandReply::from_ack(
            &ack,
            format!(
                "Set the alert to {} with message {}",
                channel.mention(),
                ack.value
            ),
        )
    }

    #[instrument(skip(self))]
    pub async fn toggle_ip(&self) -> CommandReply {
        let ack = self.core.toggle_show_address().await;
        let shown = if ack.value { "True" } else { "False" };

        CommandReply::from_ack(&ack, format!("Set show_ip to {shown}"))
    }

    /// On-demand status: addresses always shown, no player counts
    pub async fn status(&self) -> RenderedStatus {
        let view = self.core.status_snapshot().await;
        RenderedStatus::for_query(&view.snapshot)
    }
}
