//! Request and response bodies of the HTTP API

use serde::{Deserialize, Deserializer, Serialize};

use crate::ChannelId;
use crate::commands::CommandReply;
use crate::monitor::MonitorConfiguration;
use crate::registry::Endpoint;
use crate::sinks::RenderedStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub endpoints: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// What the status command shows
    pub status: RenderedStatus,
    pub endpoints: Vec<Endpoint>,
    pub config: MonitorConfiguration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoicesQuery {
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddEndpointRequest {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetChannelRequest {
    #[serde(deserialize_with = "snowflake")]
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetAlertRequest {
    #[serde(deserialize_with = "snowflake")]
    pub channel_id: ChannelId,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyResponse {
    /// Text shown to the user
    pub message: String,
    pub persisted: bool,
}

impl From<CommandReply> for ReplyResponse {
    fn from(reply: CommandReply) -> Self {
        Self {
            message: reply.text(),
            persisted: reply.persisted,
        }
    }
}

/// Discord sends snowflakes as strings; accept numbers too
fn snowflake<'de, D>(deserializer: D) -> Result<ChannelId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(id) => Ok(ChannelId(id)),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map(ChannelId)
            .map_err(|_| serde::de::Error::custom(format!("invalid channel id '{text}'"))),
    }
}
