//! Runtime monitor configuration
//!
//! Everything here is changed through commands and mirrored to the
//! [`ConfigStore`](crate::storage::ConfigStore) after every change.

use serde::{Deserialize, Serialize};

use crate::{ChannelId, MessageId};

/// Placeholder replaced by the endpoint name in alert templates
pub const SERVER_PLACEHOLDER: &str = "{server}";

/// Alert text used until a template has been configured
pub const DEFAULT_ALERT_TEMPLATE: &str = "🔴 **{server}** is offline!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfiguration {
    /// Channel holding the status message
    pub display_channel: Option<ChannelId>,

    /// The status message kept up to date every cycle
    pub display_message: Option<MessageId>,

    /// Channel receiving down alerts
    pub alert_channel: Option<ChannelId>,

    /// Alert text, `{server}` is replaced by the endpoint name
    pub alert_template: String,

    /// Show addresses next to names in the status message
    pub show_address: bool,
}

impl Default for MonitorConfiguration {
    fn default() -> Self {
        Self {
            display_channel: None,
            display_message: None,
            alert_channel: None,
            alert_template: DEFAULT_ALERT_TEMPLATE.to_string(),
            show_address: false,
        }
    }
}

/// Where the status message lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayDestination {
    pub channel: ChannelId,
    pub message: MessageId,
}

impl MonitorConfiguration {
    /// The status message, if both channel and message are known
    pub fn display_destination(&self) -> Option<DisplayDestination> {
        match (self.display_channel, self.display_message) {
            (Some(channel), Some(message)) => Some(DisplayDestination { channel, message }),
            _ => None,
        }
    }
}

/// Fill an alert template for one endpoint
pub fn render_alert(template: &str, server: &str) -> String {
    template.replace(SERVER_PLACEHOLDER, server)
}
