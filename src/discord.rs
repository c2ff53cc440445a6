//! Discord REST client implementing the display and notification sinks
//!
//! Only the three message endpoints are used:
//!
//! - `POST   /channels/{channel}/messages`: new status message, alerts
//! - `PATCH  /channels/{channel}/messages/{message}`: status refresh
//! - `DELETE /channels/{channel}/messages/{message}`: retract old status

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::monitor::{DisplayDestination, render_alert};
use crate::sinks::{DisplaySink, NotificationSink, RenderedStatus, SinkError, SinkResult};
use crate::{ChannelId, MessageId};

pub const COLOR_GREEN: u32 = 3066993;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Default)]
pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

/// Status message embed: one field per endpoint
pub fn build_status_embed(rendered: &RenderedStatus) -> Embed {
    Embed {
        author: Some(EmbedAuthor {
            name: rendered.title.clone(),
        }),
        title: None,
        description: rendered
            .entries
            .is_empty()
            .then(|| "No servers are being monitored.".to_string()),
        color: Some(COLOR_GREEN),
        fields: rendered
            .entries
            .iter()
            .map(|entry| EmbedField {
                name: entry.label.clone(),
                value: entry.value.clone(),
                inline: false,
            })
            .collect(),
        footer: Some(EmbedFooter {
            text: "Last updated".to_string(),
        }),
        timestamp: Some(rendered.generated_at.to_rfc3339()),
    }
}

#[derive(Debug, Clone)]
pub struct DiscordSettings {
    pub api_base: String,
    pub token: String,
    pub announce_recovery: bool,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

#[derive(Debug, Clone)]
pub struct DiscordClient {
    client: Client,
    api_base: String,
    token: String,
    announce_recovery: bool,
}

impl DiscordClient {
    pub fn new(settings: DiscordSettings) -> SinkResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!("guardia-status/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token: settings.token,
            announce_recovery: settings.announce_recovery,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.api_base))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
    }

    async fn check(path: &str, response: Response) -> SinkResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(SinkError::NotFound(path.to_string()));
        }

        let message = response.text().await.unwrap_or_default();
        warn!("Discord API error response ({status}): {message}");
        Err(SinkError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    /// Post `message` to `channel`, returning the new message id
    #[instrument(skip(self, message))]
    pub async fn send_message(&self, channel: ChannelId, message: &Message) -> SinkResult<MessageId> {
        let path = format!("/channels/{channel}/messages");
        let response = self.request(Method::POST, &path).json(message).send().await?;
        let created: CreatedMessage = Self::check(&path, response).await?.json().await?;

        let id = created
            .id
            .parse()
            .map(MessageId)
            .map_err(|_| SinkError::InvalidResponse(format!("bad message id {}", created.id)))?;

        debug!("sent Discord message {id}");
        Ok(id)
    }

    #[instrument(skip(self, message))]
    pub async fn edit_message(
        &self,
        destination: &DisplayDestination,
        message: &Message,
    ) -> SinkResult<()> {
        let path = format!(
            "/channels/{}/messages/{}",
            destination.channel, destination.message
        );
        let response = self.request(Method::PATCH, &path).json(message).send().await?;
        Self::check(&path, response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_message(&self, destination: &DisplayDestination) -> SinkResult<()> {
        let path = format!(
            "/channels/{}/messages/{}",
            destination.channel, destination.message
        );
        let response = self.request(Method::DELETE, &path).send().await?;
        Self::check(&path, response).await?;
        Ok(())
    }
}

#[async_trait]
impl DisplaySink for DiscordClient {
    async fn publish(
        &self,
        rendered: &RenderedStatus,
        destination: &DisplayDestination,
    ) -> SinkResult<()> {
        let message = MessageBuilder::new()
            .add_embed(build_status_embed(rendered))
            .build();
        self.edit_message(destination, &message).await
    }

    async fn create(&self, channel: ChannelId, rendered: &RenderedStatus) -> SinkResult<MessageId> {
        let message = MessageBuilder::new()
            .add_embed(build_status_embed(rendered))
            .build();
        self.send_message(channel, &message).await
    }

    async fn retract(&self, destination: &DisplayDestination) -> SinkResult<()> {
        self.delete_message(destination).await
    }
}

#[async_trait]
impl NotificationSink for DiscordClient {
    async fn notify(
        &self,
        channel: ChannelId,
        endpoint_name: &str,
        template: &str,
    ) -> SinkResult<()> {
        let message = MessageBuilder::new()
            .content(render_alert(template, endpoint_name))
            .build();
        self.send_message(channel, &message).await.map(|_| ())
    }

    async fn notify_recovered(&self, channel: ChannelId, endpoint_name: &str) -> SinkResult<()> {
        if !self.announce_recovery {
            return Ok(());
        }

        let message = MessageBuilder::new()
            .content(format!("🟢 **{endpoint_name}** is back online!"))
            .build();
        self.send_message(channel, &message).await.map(|_| ())
    }
}
