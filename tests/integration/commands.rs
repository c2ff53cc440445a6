//! Command surface tests
//!
//! These tests verify that:
//! - Replies carry the familiar confirmation texts
//! - Rejected commands surface registry errors
//! - Moving the status message posts first and retracts after
//! - Autocomplete is prefix-filtered and capped

use assert_matches::assert_matches;
use guardia_status::commands::{CommandSurface, MAX_AUTOCOMPLETE_CHOICES, PERSISTENCE_WARNING};
use guardia_status::monitor::{CoreError, DEFAULT_ALERT_TEMPLATE, DisplayDestination};
use guardia_status::registry::RegistryError;
use guardia_status::{ChannelId, MessageId};
use pretty_assertions::assert_eq;

use crate::helpers::{alive, harness};

#[tokio::test]
async fn test_add_and_remove_replies() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());

    let reply = commands.add_server(" mc.example.com ", "Survival").await.unwrap();
    assert_eq!(reply.text(), "Added Survival (mc.example.com) to the list");

    let reply = commands.remove_server("mc.example.com").await.unwrap();
    assert_eq!(reply.text(), "Removed Survival (mc.example.com) from the list");
}

#[tokio::test]
async fn test_rejected_commands() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());
    commands.add_server("mc.example.com", "Survival").await.unwrap();

    assert_matches!(
        commands.add_server("mc.example.com", "Again").await,
        Err(CoreError::Registry(RegistryError::DuplicateEndpoint(_)))
    );
    assert_matches!(
        commands.remove_server("never.example.com").await,
        Err(CoreError::Registry(RegistryError::UnknownEndpoint(_)))
    );
    assert_matches!(
        commands.add_server("host:notaport", "Broken").await,
        Err(CoreError::Registry(RegistryError::InvalidAddress(_)))
    );

    // the first entry is untouched
    let endpoint = h.core.get_endpoint("mc.example.com").await.unwrap();
    assert_eq!(endpoint.name, "Survival");
}

#[tokio::test]
async fn test_set_channel_replaces_status_message() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());

    let reply = commands.set_channel(ChannelId(10)).await.unwrap();
    assert_eq!(reply.text(), "Set the channel to <#10>");
    let first = h.core.configuration().await.display_destination().unwrap();

    commands.set_channel(ChannelId(20)).await.unwrap();
    let second = h.core.configuration().await.display_destination().unwrap();

    assert_eq!(second.channel, ChannelId(20));
    assert_ne!(second.message, first.message);
    assert_eq!(h.display.retracted(), vec![first]);
    assert_eq!(h.display.created().len(), 2);
}

#[tokio::test]
async fn test_set_channel_ignores_missing_old_message() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());

    commands.set_channel(ChannelId(10)).await.unwrap();
    h.display.retract_not_found();

    let reply = commands.set_channel(ChannelId(20)).await.unwrap();
    assert!(reply.persisted);
    assert_eq!(
        h.core.configuration().await.display_channel,
        Some(ChannelId(20))
    );
}

#[tokio::test]
async fn test_failed_create_keeps_old_display() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());

    commands.set_channel(ChannelId(10)).await.unwrap();
    let before = h.core.configuration().await.display_destination();

    h.display.fail_create();
    assert_matches!(
        commands.set_channel(ChannelId(20)).await,
        Err(CoreError::Sink(_))
    );

    assert_eq!(h.core.configuration().await.display_destination(), before);
    assert!(h.display.retracted().is_empty());
}

#[tokio::test]
async fn test_set_alert_and_toggle_replies() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());

    let reply = commands
        .set_alert(ChannelId(3), "{server} is offline, ping @admins")
        .await;
    assert_eq!(
        reply.text(),
        "Set the alert to <#3> with message {server} is offline, ping @admins"
    );

    assert_eq!(commands.toggle_ip().await.text(), "Set show_ip to True");
    assert_eq!(commands.toggle_ip().await.text(), "Set show_ip to False");
}

#[tokio::test]
async fn test_set_alert_reply_reports_its_own_template() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());

    let (first, second) = tokio::join!(
        commands.set_alert(ChannelId(1), "first {server}"),
        commands.set_alert(ChannelId(2), "second {server}"),
    );
    assert_eq!(first.text(), "Set the alert to <#1> with message first {server}");
    assert_eq!(second.text(), "Set the alert to <#2> with message second {server}");

    let fallback = commands.set_alert(ChannelId(3), "   ").await;
    assert_eq!(
        fallback.text(),
        format!("Set the alert to <#3> with message {DEFAULT_ALERT_TEMPLATE}")
    );
}

#[tokio::test]
async fn test_toggle_refreshes_display() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());
    commands.add_server("mc.example.com", "Survival").await.unwrap();
    commands.set_channel(ChannelId(1)).await.unwrap();

    commands.toggle_ip().await;

    let rendered = h.display.last_published().unwrap();
    assert_eq!(rendered.entries[0].label, "Survival (mc.example.com)");
    assert_eq!(
        h.display.published().last().unwrap().0,
        DisplayDestination {
            channel: ChannelId(1),
            message: h.core.configuration().await.display_message.unwrap_or(MessageId(0)),
        }
    );
}

#[tokio::test]
async fn test_autocomplete() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());

    for i in 0..30 {
        commands
            .add_server(&format!("play{i}.example.com"), &format!("Server {i}"))
            .await
            .unwrap();
    }
    commands.add_server("other.net", "Other").await.unwrap();

    let all = commands.autocomplete_addresses("").await;
    assert_eq!(all.len(), MAX_AUTOCOMPLETE_CHOICES);

    let filtered = commands.autocomplete_addresses("play1").await;
    // play1, play10..play19
    assert_eq!(filtered.len(), 11);
    assert_eq!(filtered[0].name, "Server 1");
    assert_eq!(filtered[0].value, "play1.example.com");

    assert!(commands.autocomplete_addresses("nothing").await.is_empty());
}

#[tokio::test]
async fn test_status_query_shows_addresses() {
    let h = harness().await;
    let commands = CommandSurface::new(h.core.clone());
    commands.add_server("mc.example.com", "Survival").await.unwrap();
    h.probe.script("mc.example.com", [alive(5, 20)]);
    h.core.run_cycle().await;

    let status = commands.status().await;
    assert_eq!(status.entries[0].label, "Survival (mc.example.com)");
    assert_eq!(status.entries[0].value, "🟢 Online");
}

#[tokio::test]
async fn test_persistence_warning_in_reply() {
    use guardia_status::commands::CommandReply;

    let reply = CommandReply {
        message: "Set show_ip to True".to_string(),
        persisted: false,
    };
    assert_eq!(
        reply.text(),
        format!("Set show_ip to True\n{PERSISTENCE_WARNING}")
    );
}
