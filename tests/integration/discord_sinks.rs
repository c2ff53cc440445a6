//! Discord REST client tests against a mock server
//!
//! These tests verify that:
//! - Status messages are created, edited and deleted on the right routes
//! - The bot token is sent on every request
//! - Alerts are plain messages with the template filled in
//! - 404s map to NotFound, other errors to Rejected

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use guardia_status::discord::{DiscordClient, DiscordSettings};
use guardia_status::monitor::DisplayDestination;
use guardia_status::sinks::{
    DisplaySink, NotificationSink, RenderedStatus, STATUS_TITLE, SinkError, StatusEntry,
};
use guardia_status::{ChannelId, MessageId};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, announce_recovery: bool) -> DiscordClient {
    DiscordClient::new(DiscordSettings {
        api_base: server.uri(),
        token: "test-token".to_string(),
        announce_recovery,
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn rendered() -> RenderedStatus {
    RenderedStatus {
        title: STATUS_TITLE.to_string(),
        entries: vec![StatusEntry {
            label: "Survival".to_string(),
            value: "🟢 Online 5/20".to_string(),
            online: true,
        }],
        generated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_create_returns_message_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/10/messages"))
        .and(header("Authorization", "Bot test-token"))
        .and(body_partial_json(json!({
            "embeds": [{ "author": { "name": "Server Status" } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1100000000000000001",
            "channel_id": "10"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client(&server, false)
        .create(ChannelId(10), &rendered())
        .await
        .unwrap();

    assert_eq!(id, MessageId(1_100_000_000_000_000_001));
}

#[tokio::test]
async fn test_publish_edits_message() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/channels/10/messages/20"))
        .and(body_partial_json(json!({
            "embeds": [{ "fields": [{ "name": "Survival", "value": "🟢 Online 5/20" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "20" })))
        .expect(1)
        .mount(&server)
        .await;

    let destination = DisplayDestination {
        channel: ChannelId(10),
        message: MessageId(20),
    };

    client(&server, false)
        .publish(&rendered(), &destination)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_retract_missing_message_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/channels/10/messages/20"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Unknown Message" })),
        )
        .mount(&server)
        .await;

    let destination = DisplayDestination {
        channel: ChannelId(10),
        message: MessageId(20),
    };

    let result = client(&server, false).retract(&destination).await;
    assert_matches!(result, Err(SinkError::NotFound(_)));
}

#[tokio::test]
async fn test_notify_sends_rendered_template() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .and(body_partial_json(json!({ "content": "Survival is down!" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, false)
        .notify(ChannelId(7), "Survival", "{server} is down!")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_forbidden_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Missing Access"))
        .mount(&server)
        .await;

    let result = client(&server, false)
        .notify(ChannelId(7), "Survival", "{server}")
        .await;

    assert_matches!(result, Err(SinkError::Rejected { status: 403, .. }));
}

#[tokio::test]
async fn test_recovery_announced_only_when_enabled() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .and(body_partial_json(json!({ "content": "🟢 **Survival** is back online!" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "2" })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, false)
        .notify_recovered(ChannelId(7), "Survival")
        .await
        .unwrap();
    client(&server, true)
        .notify_recovered(ChannelId(7), "Survival")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let client = DiscordClient::new(DiscordSettings {
        // nothing listens on port 9 locally
        api_base: "http://127.0.0.1:9".to_string(),
        token: "test-token".to_string(),
        announce_recovery: false,
        request_timeout: Duration::from_secs(2),
    })
    .unwrap();

    let result = client.notify(ChannelId(7), "Survival", "{server}").await;
    assert_matches!(result, Err(SinkError::Transport(_)));
}
